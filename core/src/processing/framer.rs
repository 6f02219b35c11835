use crate::prelude::{PipelineConfig, PipelineError, PipelineResult};
use crate::telemetry::log::LogManager;
use ndarray::Array2;

/// Multichannel sample storage, channels x samples.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    data: Array2<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(data: Array2<f32>, sample_rate: u32) -> Self {
        Self { data, sample_rate }
    }

    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> PipelineResult<Self> {
        let num_channels = channels.len();
        let samples = channels.first().map_or(0, Vec::len);
        if channels.iter().any(|ch| ch.len() != samples) {
            return Err(PipelineError::InvalidParameter(
                "channels differ in length".into(),
            ));
        }
        let flat: Vec<f32> = channels.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((num_channels, samples), flat).map_err(|e| {
            PipelineError::InvalidParameter(format!("bad audio shape: {}", e))
        })?;
        Ok(Self { data, sample_rate })
    }

    pub fn channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn samples(&self) -> usize {
        self.data.ncols()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }
}

/// One analysis frame, channels x frame_length, tagged with its index.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: usize,
    pub data: Array2<f32>,
}

/// Slices multichannel audio into hop-spaced frames and applies the
/// analysis window. Hanning coefficients are computed once at construction
/// and never mutated.
pub struct Framer {
    frame_length: usize,
    hop_length: usize,
    channels: usize,
    window: Vec<f32>,
    logger: LogManager,
}

impl Framer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            frame_length: config.frame_length,
            hop_length: config.hop_length,
            channels: config.channels,
            window: hanning_window(config.frame_length),
            logger: LogManager::for_stage("framer"),
        }
    }

    pub fn window_coefficients(&self) -> &[f32] {
        &self.window
    }

    /// Number of complete frames available in a buffer.
    pub fn frame_count(&self, buffer: &AudioBuffer) -> usize {
        let samples = buffer.samples();
        if samples < self.frame_length {
            0
        } else {
            (samples - self.frame_length) / self.hop_length + 1
        }
    }

    /// Extracts frame `index` starting at `index * hop_length`.
    pub fn frame(&self, buffer: &AudioBuffer, index: usize) -> PipelineResult<Frame> {
        if buffer.channels() != self.channels {
            return Err(PipelineError::InvalidParameter(format!(
                "expected {} channels, buffer has {}",
                self.channels,
                buffer.channels()
            )));
        }
        let start = index * self.hop_length;
        if start + self.frame_length > buffer.samples() {
            return Err(PipelineError::InvalidParameter(format!(
                "frame index {} out of range ({} samples available)",
                index,
                buffer.samples()
            )));
        }

        let data = buffer
            .data()
            .slice(ndarray::s![.., start..start + self.frame_length])
            .to_owned();
        self.logger
            .debug(&format!("extracted frame {} at sample {}", index, start));
        Ok(Frame { index, data })
    }

    /// Applies the Hanning window elementwise to every channel. Pure with
    /// respect to everything but the frame contents; call exactly once per
    /// frame.
    pub fn apply_window(&self, frame: &mut Frame) {
        for mut channel in frame.data.rows_mut() {
            for (value, &w) in channel.iter_mut().zip(self.window.iter()) {
                *value *= w;
            }
        }
    }
}

/// w[i] = 0.5 * (1 - cos(2 pi i / (L - 1)))
fn hanning_window(length: usize) -> Vec<f32> {
    if length == 1 {
        return vec![0.0];
    }
    (0..length)
        .map(|i| {
            0.5 * (1.0
                - (2.0 * std::f32::consts::PI * i as f32 / (length - 1) as f32).cos())
        })
        .collect()
}
