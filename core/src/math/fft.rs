use crate::prelude::{PipelineError, PipelineResult};
use num_complex::Complex32;

/// Iterative radix-2 Cooley-Tukey transform with twiddle and bit-reversal
/// tables precomputed at construction.
///
/// The forward transform takes real input; the inverse accepts arbitrary
/// complex input (the PHAT-weighted spectrum is reconstructed, not
/// guaranteed conjugate-symmetric bit for bit) and applies 1/n scaling.
pub struct FftEngine {
    size: usize,
    log2_size: u32,
    twiddles: Vec<Complex32>,
    bit_reverse: Vec<usize>,
}

impl FftEngine {
    pub fn new(size: usize) -> PipelineResult<Self> {
        if !size.is_power_of_two() || size < 2 {
            return Err(PipelineError::InvalidParameter(format!(
                "fft size {} is not a power of two",
                size
            )));
        }
        let log2_size = size.trailing_zeros();

        // W_n^k = exp(-j 2 pi k / n) for k in [0, n/2)
        let mut twiddles = Vec::with_capacity(size / 2);
        for k in 0..size / 2 {
            let angle = -2.0 * std::f32::consts::PI * k as f32 / size as f32;
            twiddles.push(Complex32::new(angle.cos(), angle.sin()));
        }

        let mut bit_reverse = Vec::with_capacity(size);
        for i in 0..size {
            bit_reverse.push(reverse_bits(i, log2_size));
        }

        Ok(Self {
            size,
            log2_size,
            twiddles,
            bit_reverse,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform of a real signal. Returns all n bins; only the
    /// first n/2+1 carry independent information.
    pub fn forward(&self, input: &[f32]) -> PipelineResult<Vec<Complex32>> {
        if input.len() != self.size {
            return Err(PipelineError::FftFailure(format!(
                "forward input length {} does not match fft size {}",
                input.len(),
                self.size
            )));
        }

        let mut buffer = vec![Complex32::new(0.0, 0.0); self.size];
        for (i, &value) in input.iter().enumerate() {
            buffer[self.bit_reverse[i]] = Complex32::new(value, 0.0);
        }

        self.butterflies(&mut buffer, false);
        Ok(buffer)
    }

    /// Inverse transform with 1/n normalization.
    pub fn inverse(&self, input: &[Complex32]) -> PipelineResult<Vec<Complex32>> {
        if input.len() != self.size {
            return Err(PipelineError::FftFailure(format!(
                "inverse input length {} does not match fft size {}",
                input.len(),
                self.size
            )));
        }

        let mut buffer = vec![Complex32::new(0.0, 0.0); self.size];
        for (i, &value) in input.iter().enumerate() {
            buffer[self.bit_reverse[i]] = value;
        }

        self.butterflies(&mut buffer, true);

        let scale = 1.0 / self.size as f32;
        for value in buffer.iter_mut() {
            *value *= scale;
        }
        Ok(buffer)
    }

    fn butterflies(&self, buffer: &mut [Complex32], conjugate: bool) {
        for stage in 1..=self.log2_size {
            let span = 1usize << stage;
            let half = span >> 1;
            let stride = self.size / span;

            for block in (0..self.size).step_by(span) {
                for offset in 0..half {
                    let mut w = self.twiddles[offset * stride];
                    if conjugate {
                        w = w.conj();
                    }
                    let t = w * buffer[block + offset + half];
                    let u = buffer[block + offset];
                    buffer[block + offset] = u + t;
                    buffer[block + offset + half] = u - t;
                }
            }
        }
    }
}

fn reverse_bits(value: usize, bits: u32) -> usize {
    let mut input = value;
    let mut output = 0;
    for _ in 0..bits {
        output = (output << 1) | (input & 1);
        input >>= 1;
    }
    output
}
