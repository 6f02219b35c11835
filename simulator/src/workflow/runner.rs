use crate::generator::signals::{build_test_audio, ring_array};
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::info;
use srpcore::persist;
use srpcore::processing::{AudioBuffer, Pipeline, SrpPeak};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Summary of one offline run.
pub struct WorkflowResult {
    pub frames_processed: usize,
    pub frames_failed: usize,
    pub elapsed_seconds: f64,
    pub first_peak: Option<SrpPeak>,
}

impl WorkflowResult {
    pub fn frames_per_second(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            self.frames_processed as f64 / self.elapsed_seconds
        } else {
            0.0
        }
    }
}

pub struct Runner {
    config: WorkflowConfig,
    output_dir: PathBuf,
    save_intermediate: bool,
}

impl Runner {
    pub fn new(config: WorkflowConfig, output_dir: PathBuf, save_intermediate: bool) -> Self {
        Self {
            config,
            output_dir,
            save_intermediate,
        }
    }

    /// Generates the synthetic capture, runs the pipeline over every frame
    /// and persists frame 0's intermediates when requested.
    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let pipeline_config = self.config.to_pipeline_config();
        let geometry = ring_array(self.config.channels, self.config.array_radius_m);

        let build_start = Instant::now();
        let mut pipeline = Pipeline::new(pipeline_config.clone(), &geometry)
            .context("building localization pipeline")?;
        info!(
            "pipeline ready in {:.1} ms ({} pairs, {} grid cells)",
            build_start.elapsed().as_secs_f64() * 1e3,
            pipeline_config.num_pairs(),
            pipeline_config.grid.cells()
        );

        let audio = build_test_audio(
            &pipeline_config,
            &geometry,
            &self.config.source,
            self.config.total_samples(),
        )
        .context("generating synthetic audio")?;

        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("creating output dir {}", self.output_dir.display()))?;
        persist::save_geometry(self.path("geometry.json"), &geometry)
            .context("saving geometry")?;

        let first_peak = if self.save_intermediate {
            Some(self.save_first_frame(&mut pipeline, &audio)?)
        } else {
            None
        };

        let run_start = Instant::now();
        let results = pipeline.process_stream(&audio);
        let elapsed_seconds = run_start.elapsed().as_secs_f64();
        let snapshot = pipeline.metrics().snapshot();

        Ok(WorkflowResult {
            frames_processed: snapshot.processed,
            frames_failed: snapshot.failed,
            elapsed_seconds,
            first_peak: first_peak.or_else(|| results.first().map(|a| a.peak)),
        })
    }

    fn save_first_frame(
        &self,
        pipeline: &mut Pipeline,
        audio: &AudioBuffer,
    ) -> anyhow::Result<SrpPeak> {
        let analysis = pipeline
            .process_frame(audio, 0)
            .context("processing frame 0 for intermediate dumps")?;

        persist::save_audio(self.path("audio_data.bin"), audio).context("saving audio")?;
        persist::save_spectra(self.path("fft_result.bin"), &analysis.spectra)
            .context("saving spectra")?;
        persist::save_gcc(self.path("gcc_result.bin"), &analysis.gcc)
            .context("saving gcc curves")?;
        persist::save_srp(self.path("srp_result.bin"), &analysis.srp)
            .context("saving srp map")?;
        if let Some(table) = pipeline.tau_table() {
            persist::save_tau_table(self.path("tau_table.bin"), table)
                .context("saving tau table")?;
        }

        let srp_flat: Vec<f32> = analysis.srp.iter().copied().collect();
        let (elev, azim, range) = analysis.srp.dim();
        persist::save_matrix_text(
            self.path("srp_result.txt"),
            &srp_flat,
            elev,
            azim * range,
        )
        .context("saving srp text dump")?;

        info!(
            "frame 0 peak: elevation {:.1} deg, azimuth {:.1} deg, range {:.2} m, power {:.4}",
            analysis.peak.elevation_rad.to_degrees(),
            analysis.peak.azimuth_rad.to_degrees(),
            analysis.peak.range_m,
            analysis.peak.power
        );
        Ok(analysis.peak)
    }

    fn path(&self, name: &str) -> PathBuf {
        Path::new(&self.output_dir).join(name)
    }
}
