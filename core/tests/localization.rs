//! End-to-end localization of a synthetic point source with a ring array.

use rand::{rngs::StdRng, Rng, SeedableRng};
use srpcore::array::{MicArray, MicPosition};
use srpcore::prelude::{GridSpec, PipelineConfig};
use srpcore::processing::{AudioBuffer, Pipeline};
use std::f32::consts::PI;

fn ring_array(channels: usize, radius: f32) -> MicArray {
    let positions = (0..channels)
        .map(|i| {
            let angle = 2.0 * PI * i as f32 / channels as f32;
            MicPosition::new(radius * angle.cos(), radius * angle.sin(), 0.0)
        })
        .collect();
    MicArray::new(positions)
}

/// Box-Muller gaussian over the uniform generator.
fn randn(rng: &mut StdRng) -> f32 {
    loop {
        let u: f32 = rng.gen_range(-1.0..1.0);
        let v: f32 = rng.gen_range(-1.0..1.0);
        let s = u * u + v * v;
        if s > 0.0 && s < 1.0 {
            return u * (-2.0 * s.ln() / s).sqrt();
        }
    }
}

#[test]
fn ring_array_localizes_a_point_source_in_azimuth() {
    let config = PipelineConfig {
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
    };
    let geometry = ring_array(config.channels, 0.05);

    // 1 kHz source at azimuth 45 deg, elevation 90 deg (in the array
    // plane), 2 m away, 20 dB SNR.
    let source_azimuth = PI / 4.0;
    let (sx, sy, sz) = (
        2.0 * source_azimuth.cos(),
        2.0 * source_azimuth.sin(),
        0.0f32,
    );
    let frequency = 1000.0f32;
    let amplitude = 0.8f32;
    let snr_db = 20.0f32;
    let total_samples = config.frame_length + 3 * config.hop_length;

    let mut rng = StdRng::seed_from_u64(42);
    let noise_std = {
        let signal_power = amplitude * amplitude / 2.0;
        (signal_power / 10f32.powf(snr_db / 10.0)).sqrt()
    };

    let channels: Vec<Vec<f32>> = geometry
        .positions()
        .iter()
        .map(|mic| {
            let delay_samples =
                mic.distance_to(sx, sy, sz) / config.speed_of_sound * config.sample_rate as f32;
            (0..total_samples)
                .map(|i| {
                    let t = (i as f32 - delay_samples) / config.sample_rate as f32;
                    amplitude * (2.0 * PI * frequency * t).sin() + noise_std * randn(&mut rng)
                })
                .collect()
        })
        .collect();
    let buffer = AudioBuffer::from_channels(channels, config.sample_rate).unwrap();

    let mut pipeline = Pipeline::new(config.clone(), &geometry).unwrap();
    let analysis = pipeline.process_frame(&buffer, 0).unwrap();

    let azimuth_step = 2.0 * PI / (config.grid.azimuth_bins - 1) as f32;
    let error = (analysis.peak.azimuth_rad - source_azimuth).abs();
    assert!(
        error <= azimuth_step + 1e-6,
        "estimated azimuth {:.3} rad, expected {:.3} rad (step {:.3})",
        analysis.peak.azimuth_rad,
        source_azimuth,
        azimuth_step
    );
}

#[test]
fn bulk_processing_skips_nothing_on_clean_input() {
    let config = PipelineConfig {
        channels: 4,
        frame_length: 256,
        hop_length: 128,
        fft_size: 256,
        grid: GridSpec {
            elevation_bins: 5,
            azimuth_bins: 9,
            range_values: vec![1.0, 2.0],
        },
        ..Default::default()
    };
    let geometry = ring_array(config.channels, 0.04);

    let mut rng = StdRng::seed_from_u64(3);
    let channels: Vec<Vec<f32>> = (0..config.channels)
        .map(|_| (0..256 + 128 * 3).map(|_| randn(&mut rng) * 0.1).collect())
        .collect();
    let buffer = AudioBuffer::from_channels(channels, config.sample_rate).unwrap();

    let mut pipeline = Pipeline::new(config, &geometry).unwrap();
    let results = pipeline.process_stream(&buffer);
    assert_eq!(results.len(), 4);
    let snapshot = pipeline.metrics().snapshot();
    assert_eq!(snapshot.processed, 4);
    assert_eq!(snapshot.failed, 0);
}
