use crate::array::MicArray;
use crate::math::{FftEngine, StatsHelper};
use crate::prelude::{PipelineConfig, PipelineResult};
use crate::processing::framer::{AudioBuffer, Framer};
use crate::processing::gcc_phat::GccPhatEngine;
use crate::processing::srp_map::{SrpEngine, SrpPeak, TauTable};
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::MetricsRecorder;
use log::warn;
use ndarray::{Array2, Array3};
use num_complex::Complex32;

/// Everything produced for one frame. Owned by the caller; nothing is
/// retained between invocations.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub frame_index: usize,
    pub spectra: Array2<Complex32>,
    pub gcc: Array2<f32>,
    pub srp: Array3<f32>,
    pub peak: SrpPeak,
}

/// Immutable per-frame context: window, twiddle tables, pair enumeration
/// and Tau table are all built once here, then only read.
pub struct Pipeline {
    config: PipelineConfig,
    framer: Framer,
    fft: FftEngine,
    gcc: GccPhatEngine,
    srp: SrpEngine,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl Pipeline {
    /// Validates the configuration and builds every table, including the
    /// Tau table for the supplied geometry.
    pub fn new(config: PipelineConfig, geometry: &MicArray) -> PipelineResult<Self> {
        config.validate()?;
        let framer = Framer::new(&config);
        let fft = FftEngine::new(config.fft_size)?;
        let gcc = GccPhatEngine::new(&config)?;
        let mut srp = SrpEngine::new(&config);
        srp.build_tau_table(geometry, gcc.pairs(), &config)?;

        Ok(Self {
            config,
            framer,
            fft,
            gcc,
            srp,
            metrics: MetricsRecorder::new(),
            logger: LogManager::for_stage("pipeline"),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn framer(&self) -> &Framer {
        &self.framer
    }

    pub fn tau_table(&self) -> Option<&TauTable> {
        self.srp.tau_table()
    }

    /// Replaces the Tau table with a previously persisted one.
    pub fn install_tau_table(&mut self, table: TauTable) -> PipelineResult<()> {
        self.srp.install_tau_table(table)
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    /// Windowed per-channel forward transforms for one frame.
    pub fn spectra(
        &self,
        buffer: &AudioBuffer,
        frame_index: usize,
    ) -> PipelineResult<Array2<Complex32>> {
        let mut frame = self.framer.frame(buffer, frame_index)?;
        self.framer.apply_window(&mut frame);

        let bins = self.config.fft_bins();
        let mut padded = vec![0.0f32; self.config.fft_size];
        let mut spectra = Array2::from_elem((self.config.channels, bins), Complex32::new(0.0, 0.0));
        for (channel, samples) in frame.data.rows().into_iter().enumerate() {
            padded.fill(0.0);
            for (slot, &value) in padded.iter_mut().zip(samples.iter()) {
                *slot = value;
            }
            let spectrum = self.fft.forward(&padded)?;
            for bin in 0..bins {
                spectra[(channel, bin)] = spectrum[bin];
            }
        }
        Ok(spectra)
    }

    /// Runs frame -> window -> FFT -> GCC-PHAT -> SRP for a single frame.
    /// Completes or fails atomically; a failed frame leaves no output.
    pub fn process_frame(
        &mut self,
        buffer: &AudioBuffer,
        frame_index: usize,
    ) -> PipelineResult<FrameAnalysis> {
        let frame = self.framer.frame(buffer, frame_index)?;
        let frame_rms = StatsHelper::rms(frame.data.row(0).to_vec().as_slice());
        self.logger.debug(&format!(
            "frame {} channel-0 RMS {:.6}",
            frame_index, frame_rms
        ));

        let spectra = self.spectra(buffer, frame_index)?;
        let gcc = self.gcc.compute_all(&spectra)?;
        let srp = self.srp.project(&gcc)?;
        let peak = self.srp.peak(&srp);

        Ok(FrameAnalysis {
            frame_index,
            spectra,
            gcc,
            srp,
            peak,
        })
    }

    /// Processes every complete frame in the buffer. A failing frame is
    /// skipped with a warning; shared tables are never touched, so later
    /// frames stay valid. Outcome counts land in the metrics recorder.
    pub fn process_stream(&mut self, buffer: &AudioBuffer) -> Vec<FrameAnalysis> {
        let frames = self.framer.frame_count(buffer);
        let mut results = Vec::with_capacity(frames);
        for frame_index in 0..frames {
            match self.process_frame(buffer, frame_index) {
                Ok(analysis) => {
                    self.metrics.record_processed();
                    results.push(analysis);
                }
                Err(err) => {
                    self.metrics.record_failed();
                    warn!("skipping frame {}: {}", frame_index, err);
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::MicPosition;
    use crate::prelude::GridSpec;

    fn four_mic_config() -> PipelineConfig {
        PipelineConfig {
            channels: 4,
            frame_length: 128,
            hop_length: 64,
            fft_size: 128,
            grid: GridSpec {
                elevation_bins: 3,
                azimuth_bins: 9,
                range_values: vec![1.0, 2.0],
            },
            ..Default::default()
        }
    }

    fn square_array() -> MicArray {
        MicArray::new(vec![
            MicPosition::new(0.05, 0.0, 0.0),
            MicPosition::new(0.0, 0.05, 0.0),
            MicPosition::new(-0.05, 0.0, 0.0),
            MicPosition::new(0.0, -0.05, 0.0),
        ])
    }

    fn tone_buffer(config: &PipelineConfig, samples: usize) -> AudioBuffer {
        let channels: Vec<Vec<f32>> = (0..config.channels)
            .map(|c| {
                (0..samples)
                    .map(|i| {
                        (2.0 * std::f32::consts::PI * 1000.0 * (i + c) as f32
                            / config.sample_rate as f32)
                            .sin()
                    })
                    .collect()
            })
            .collect();
        AudioBuffer::from_channels(channels, config.sample_rate).unwrap()
    }

    #[test]
    fn process_frame_produces_consistent_shapes() {
        let config = four_mic_config();
        let mut pipeline = Pipeline::new(config.clone(), &square_array()).unwrap();
        let buffer = tone_buffer(&config, 256);

        let analysis = pipeline.process_frame(&buffer, 0).unwrap();
        assert_eq!(analysis.spectra.dim(), (4, config.fft_bins()));
        assert_eq!(analysis.gcc.dim(), (6, config.gcc_length()));
        assert_eq!(
            analysis.srp.dim(),
            (3, 9, 2)
        );
        assert!(analysis.peak.power.is_finite());
    }

    #[test]
    fn out_of_range_frame_fails_atomically() {
        let config = four_mic_config();
        let mut pipeline = Pipeline::new(config.clone(), &square_array()).unwrap();
        let buffer = tone_buffer(&config, 256);
        assert!(pipeline.process_frame(&buffer, 99).is_err());
        // The context is untouched and keeps working.
        assert!(pipeline.process_frame(&buffer, 0).is_ok());
    }

    #[test]
    fn process_stream_counts_outcomes() {
        let config = four_mic_config();
        let mut pipeline = Pipeline::new(config.clone(), &square_array()).unwrap();
        let buffer = tone_buffer(&config, 128 + 64 * 2);

        let results = pipeline.process_stream(&buffer);
        assert_eq!(results.len(), 3);
        let snapshot = pipeline.metrics().snapshot();
        assert_eq!(snapshot.processed, 3);
        assert_eq!(snapshot.failed, 0);
    }

    #[test]
    fn geometry_mismatch_fails_construction() {
        let config = four_mic_config();
        let geometry = MicArray::new(vec![MicPosition::new(0.0, 0.0, 0.0)]);
        assert!(Pipeline::new(config, &geometry).is_err());
    }
}
