use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Validated runtime configuration shared by every pipeline component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub channels: usize,
    pub sample_rate: u32,
    pub frame_length: usize,
    pub hop_length: usize,
    pub fft_size: usize,
    pub speed_of_sound: f32,
    pub grid: GridSpec,
}

/// Spherical search grid: elevation spans [0, pi], azimuth [-pi, pi], both
/// endpoints inclusive. Range hypotheses are an explicit ordered list in
/// meters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSpec {
    pub elevation_bins: usize,
    pub azimuth_bins: usize,
    pub range_values: Vec<f32>,
}

impl GridSpec {
    pub fn elevation(&self, bin: usize) -> f32 {
        PI * bin as f32 / (self.elevation_bins - 1) as f32
    }

    pub fn azimuth(&self, bin: usize) -> f32 {
        -PI + 2.0 * PI * bin as f32 / (self.azimuth_bins - 1) as f32
    }

    pub fn range_bins(&self) -> usize {
        self.range_values.len()
    }

    /// Elevation-major flat index, shared by the Tau table and the projector.
    pub fn flat_index(&self, elev: usize, azim: usize, range: usize) -> usize {
        elev * self.azimuth_bins * self.range_bins() + azim * self.range_bins() + range
    }

    pub fn cells(&self) -> usize {
        self.elevation_bins * self.azimuth_bins * self.range_bins()
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.elevation_bins < 2 || self.azimuth_bins < 2 {
            return Err(PipelineError::InvalidParameter(
                "grid needs at least 2 bins per angular axis".into(),
            ));
        }
        if self.range_values.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "grid range list is empty".into(),
            ));
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// Number of meaningful spectrum bins for real input.
    pub fn fft_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Correlation curves span the full transform length.
    pub fn gcc_length(&self) -> usize {
        self.fft_size
    }

    pub fn num_pairs(&self) -> usize {
        self.channels * (self.channels - 1) / 2
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.channels < 2 {
            return Err(PipelineError::InvalidParameter(format!(
                "need at least 2 channels, got {}",
                self.channels
            )));
        }
        if self.frame_length == 0 || self.hop_length == 0 {
            return Err(PipelineError::InvalidParameter(
                "frame and hop lengths must be non-zero".into(),
            ));
        }
        if !self.fft_size.is_power_of_two() || self.fft_size < 2 {
            return Err(PipelineError::InvalidParameter(format!(
                "fft size {} is not a power of two",
                self.fft_size
            )));
        }
        if self.fft_size < self.frame_length {
            return Err(PipelineError::InvalidParameter(format!(
                "fft size {} is shorter than frame length {}",
                self.fft_size, self.frame_length
            )));
        }
        if self.sample_rate == 0 {
            return Err(PipelineError::InvalidParameter(
                "sample rate must be non-zero".into(),
            ));
        }
        if self.speed_of_sound <= 0.0 {
            return Err(PipelineError::InvalidParameter(
                "speed of sound must be positive".into(),
            ));
        }
        self.grid.validate()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channels: 12,
            sample_rate: 16_000,
            frame_length: 512,
            hop_length: 256,
            fft_size: 512,
            speed_of_sound: 343.0,
            grid: GridSpec {
                elevation_bins: 13,
                azimuth_bins: 25,
                range_values: vec![0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0],
            },
        }
    }
}

/// Common error type for the localization pipeline.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("allocation failure: {0}")]
    MemoryAllocation(String),
    #[error("fft failure: {0}")]
    FftFailure(String),
    #[error("not initialized: {0}")]
    NotInitialized(String),
    #[error("index out of range: {0}")]
    OutOfRange(String),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.fft_bins(), 257);
        assert_eq!(config.gcc_length(), 512);
        assert_eq!(config.num_pairs(), 66);
    }

    #[test]
    fn config_rejects_non_power_of_two_fft() {
        let config = PipelineConfig {
            fft_size: 500,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn config_rejects_fft_shorter_than_frame() {
        let config = PipelineConfig {
            frame_length: 1024,
            fft_size: 512,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_rejects_single_channel() {
        let config = PipelineConfig {
            channels: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn grid_rejects_empty_range_list() {
        let grid = GridSpec {
            elevation_bins: 4,
            azimuth_bins: 4,
            range_values: vec![],
        };
        assert!(grid.validate().is_err());
    }

    #[test]
    fn grid_spans_inclusive_endpoints() {
        let grid = GridSpec {
            elevation_bins: 13,
            azimuth_bins: 25,
            range_values: vec![1.0],
        };
        assert!((grid.elevation(0)).abs() < 1e-6);
        assert!((grid.elevation(12) - PI).abs() < 1e-6);
        assert!((grid.azimuth(0) + PI).abs() < 1e-6);
        assert!((grid.azimuth(24) - PI).abs() < 1e-6);
    }

    #[test]
    fn flat_index_is_elevation_major() {
        let grid = GridSpec {
            elevation_bins: 3,
            azimuth_bins: 4,
            range_values: vec![0.5, 1.0],
        };
        assert_eq!(grid.flat_index(0, 0, 0), 0);
        assert_eq!(grid.flat_index(0, 0, 1), 1);
        assert_eq!(grid.flat_index(0, 1, 0), 2);
        assert_eq!(grid.flat_index(1, 0, 0), 8);
        assert_eq!(grid.flat_index(2, 3, 1), grid.cells() - 1);
    }
}
