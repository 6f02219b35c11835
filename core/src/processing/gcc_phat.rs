use crate::array::MicPairs;
use crate::math::FftEngine;
use crate::prelude::{PipelineConfig, PipelineError, PipelineResult};
use crate::processing::buffer_pool::BufferPool;
use crate::telemetry::log::LogManager;
use ndarray::Array2;
use num_complex::Complex32;

/// Magnitude floor below which a PHAT-weighted bin is zeroed instead of
/// normalized, keeping spectral nulls from blowing up.
const PHAT_EPSILON: f32 = 1e-10;

/// Generalized cross-correlation with phase transform, one curve per
/// microphone pair.
///
/// `compute_pair` is pure and shares no mutable state, so pairs may be
/// evaluated in any order. `compute_all` walks the canonical enumeration and
/// aborts the frame on the first pair failure.
pub struct GccPhatEngine {
    fft: FftEngine,
    pairs: MicPairs,
    fft_bins: usize,
    scratch: BufferPool<Complex32>,
    logger: LogManager,
}

impl GccPhatEngine {
    pub fn new(config: &PipelineConfig) -> PipelineResult<Self> {
        let fft = FftEngine::new(config.fft_size)?;
        Ok(Self {
            fft,
            pairs: MicPairs::new(config.channels),
            fft_bins: config.fft_bins(),
            scratch: BufferPool::with_capacity(2),
            logger: LogManager::for_stage("gcc-phat"),
        })
    }

    pub fn pairs(&self) -> &MicPairs {
        &self.pairs
    }

    pub fn gcc_length(&self) -> usize {
        self.fft.size()
    }

    /// Correlation curve for one pair of spectra. The result has
    /// `gcc_length` real values with zero lag at the center index; a
    /// positive lag means channel `m1` receives later than `m2`.
    pub fn compute_pair(
        &self,
        spectrum1: &[Complex32],
        spectrum2: &[Complex32],
    ) -> PipelineResult<Vec<f32>> {
        let mut cross = vec![Complex32::new(0.0, 0.0); self.fft.size()];
        self.fill_cross_spectrum(spectrum1, spectrum2, &mut cross)?;

        let ifft = self.fft.inverse(&cross)?;
        Ok(shift_real(&ifft))
    }

    /// All pairs at once into a pairs x gcc_length matrix, reusing pooled
    /// scratch for the reconstructed spectrum.
    pub fn compute_all(&mut self, spectra: &Array2<Complex32>) -> PipelineResult<Array2<f32>> {
        if spectra.nrows() != self.pairs.channels() || spectra.ncols() != self.fft_bins {
            return Err(PipelineError::InvalidParameter(format!(
                "spectra shape {}x{} does not match {} channels x {} bins",
                spectra.nrows(),
                spectra.ncols(),
                self.pairs.channels(),
                self.fft_bins
            )));
        }

        let gcc_length = self.fft.size();
        let pair_list: Vec<(usize, usize)> = self.pairs.iter().collect();
        let mut output = Array2::zeros((pair_list.len(), gcc_length));
        let mut cross = self.scratch.checkout(gcc_length)?;

        for (pair_index, (m1, m2)) in pair_list.into_iter().enumerate() {
            let s1 = spectra.row(m1).to_vec();
            let s2 = spectra.row(m2).to_vec();
            let result = self
                .fill_cross_spectrum(&s1, &s2, &mut cross)
                .and_then(|_| self.fft.inverse(&cross));

            let ifft = match result {
                Ok(ifft) => ifft,
                Err(err) => {
                    self.logger.debug(&format!(
                        "pair {} (mic {}, {}) failed, aborting frame",
                        pair_index, m1, m2
                    ));
                    self.scratch.release(cross);
                    return Err(err);
                }
            };

            let curve = shift_real(&ifft);
            for (lag, &value) in curve.iter().enumerate() {
                output[(pair_index, lag)] = value;
            }
        }

        self.scratch.release(cross);
        Ok(output)
    }

    /// Cross-power spectrum with PHAT weighting over the non-negative bins,
    /// then negative frequencies rebuilt by conjugate symmetry. DC and
    /// Nyquist stay unmirrored.
    fn fill_cross_spectrum(
        &self,
        spectrum1: &[Complex32],
        spectrum2: &[Complex32],
        cross: &mut [Complex32],
    ) -> PipelineResult<()> {
        if spectrum1.len() < self.fft_bins || spectrum2.len() < self.fft_bins {
            return Err(PipelineError::InvalidParameter(format!(
                "spectrum shorter than {} bins",
                self.fft_bins
            )));
        }

        cross.fill(Complex32::new(0.0, 0.0));
        for bin in 0..self.fft_bins {
            let product = spectrum1[bin] * spectrum2[bin].conj();
            let magnitude = product.norm();
            cross[bin] = if magnitude > PHAT_EPSILON {
                product / magnitude
            } else {
                Complex32::new(0.0, 0.0)
            };
        }
        let size = self.fft.size();
        for bin in 1..self.fft_bins - 1 {
            cross[size - bin] = cross[bin].conj();
        }
        Ok(())
    }
}

/// Real part of the inverse transform with fftshift, zero lag centered.
fn shift_real(ifft: &[Complex32]) -> Vec<f32> {
    let size = ifft.len();
    let half = size / 2;
    let mut output = vec![0.0f32; size];
    for (i, value) in ifft.iter().enumerate() {
        output[(i + half) % size] = value.re;
    }
    output
}
