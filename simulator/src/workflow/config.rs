use crate::generator::signals::SourceConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use srpcore::prelude::{GridSpec, PipelineConfig};
use std::fs;
use std::path::Path;

/// Full offline-run description: pipeline parameters, array shape, the
/// synthetic source, and how many frames to generate.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub channels: usize,
    pub sample_rate: u32,
    pub frame_length: usize,
    pub hop_length: usize,
    pub fft_size: usize,
    pub speed_of_sound: f32,
    pub elevation_bins: usize,
    pub azimuth_bins: usize,
    pub range_values: Vec<f32>,
    pub array_radius_m: f32,
    pub num_frames: usize,
    pub source: SourceConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            channels: pipeline.channels,
            sample_rate: pipeline.sample_rate,
            frame_length: pipeline.frame_length,
            hop_length: pipeline.hop_length,
            fft_size: pipeline.fft_size,
            speed_of_sound: pipeline.speed_of_sound,
            elevation_bins: pipeline.grid.elevation_bins,
            azimuth_bins: pipeline.grid.azimuth_bins,
            range_values: pipeline.grid.range_values,
            array_radius_m: 0.05,
            num_frames: 100,
            source: SourceConfig::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            channels: self.channels,
            sample_rate: self.sample_rate,
            frame_length: self.frame_length,
            hop_length: self.hop_length,
            fft_size: self.fft_size,
            speed_of_sound: self.speed_of_sound,
            grid: GridSpec {
                elevation_bins: self.elevation_bins,
                azimuth_bins: self.azimuth_bins,
                range_values: self.range_values.clone(),
            },
        }
    }

    /// Samples needed for `num_frames` hop-spaced frames.
    pub fn total_samples(&self) -> usize {
        self.frame_length + self.num_frames.saturating_sub(1) * self.hop_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_produces_valid_pipeline_config() {
        let cfg = WorkflowConfig::default();
        cfg.to_pipeline_config().validate().unwrap();
        assert_eq!(cfg.total_samples(), 512 + 99 * 256);
    }

    #[test]
    fn config_load_reads_yaml_overrides() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"channels: 8\nfft_size: 1024\nframe_length: 1024\nnum_frames: 5\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.channels, 8);
        assert_eq!(cfg.fft_size, 1024);
        assert_eq!(cfg.num_frames, 5);
        // Unspecified fields keep their defaults.
        assert_eq!(cfg.sample_rate, 16_000);
    }
}
