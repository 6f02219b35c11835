use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Offline driver for the acoustic localization core")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Directory for generated outputs
    #[arg(long, default_value = "output")]
    output: PathBuf,
    /// Override the number of frames to generate and process
    #[arg(long)]
    frames: Option<usize>,
    /// Persist frame-0 intermediates (audio/FFT/GCC/SRP/Tau)
    #[arg(long, default_value_t = false)]
    save_intermediate: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::default()
    };
    if let Some(frames) = args.frames {
        config.num_frames = frames;
    }

    let runner = Runner::new(config, args.output, args.save_intermediate);
    let result = runner.execute().context("executing workflow")?;

    println!("Frames processed: {}", result.frames_processed);
    println!("Frames failed:    {}", result.frames_failed);
    println!(
        "Elapsed: {:.3} s ({:.1} frames/s)",
        result.elapsed_seconds,
        result.frames_per_second()
    );
    if let Some(peak) = result.first_peak {
        println!(
            "First-frame peak: elevation {:.1} deg, azimuth {:.1} deg, range {:.2} m",
            peak.elevation_rad.to_degrees(),
            peak.azimuth_rad.to_degrees(),
            peak.range_m
        );
    }
    Ok(())
}
