use anyhow::Context;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use srpcore::array::{MicArray, MicPosition};
use srpcore::math::StatsHelper;
use srpcore::prelude::PipelineConfig;
use srpcore::processing::AudioBuffer;
use std::f32::consts::PI;

/// Synthetic point-source scenario played into a ring array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub frequency_hz: f32,
    pub amplitude: f32,
    pub azimuth_deg: f32,
    pub elevation_deg: f32,
    pub range_m: f32,
    pub snr_db: f32,
    pub seed: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 1000.0,
            amplitude: 0.8,
            azimuth_deg: 45.0,
            elevation_deg: 90.0,
            range_m: 2.0,
            snr_db: 20.0,
            seed: 0,
        }
    }
}

/// Planar ring array in the z=0 plane, mic 0 on the +x axis. Test-data
/// geometry only; production geometry arrives from outside the core.
pub fn ring_array(channels: usize, radius_m: f32) -> MicArray {
    let positions = (0..channels)
        .map(|i| {
            let angle = 2.0 * PI * i as f32 / channels as f32;
            MicPosition::new(radius_m * angle.cos(), radius_m * angle.sin(), 0.0)
        })
        .collect();
    MicArray::new(positions)
}

/// Sine delayed by a fractional number of samples.
pub fn delayed_sine(
    num_samples: usize,
    sample_rate: u32,
    frequency_hz: f32,
    delay_samples: f32,
    amplitude: f32,
) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = (i as f32 - delay_samples) / sample_rate as f32;
            amplitude * (2.0 * PI * frequency_hz * t).sin()
        })
        .collect()
}

/// Box-Muller gaussian deviate over the uniform generator.
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

/// Adds white gaussian noise scaled to hit `snr_db` against the signal's
/// measured power.
pub fn add_noise(samples: &mut [f32], snr_db: f32, rng: &mut StdRng) {
    let signal_power = StatsHelper::power(samples);
    if signal_power <= 0.0 {
        return;
    }
    let noise_std = (signal_power / 10f32.powf(snr_db / 10.0)).sqrt();
    for value in samples.iter_mut() {
        *value += noise_std * randn(rng);
    }
}

/// Multichannel capture of the configured source: per-mic propagation delay
/// from the true geometry, then independent noise per channel.
pub fn build_test_audio(
    config: &PipelineConfig,
    geometry: &MicArray,
    source: &SourceConfig,
    num_samples: usize,
) -> anyhow::Result<AudioBuffer> {
    let elevation = source.elevation_deg.to_radians();
    let azimuth = source.azimuth_deg.to_radians();
    let sx = source.range_m * elevation.sin() * azimuth.cos();
    let sy = source.range_m * elevation.sin() * azimuth.sin();
    let sz = source.range_m * elevation.cos();

    let mut rng = StdRng::seed_from_u64(source.seed);
    let mut channels = Vec::with_capacity(geometry.len());
    for mic in geometry.positions() {
        let delay_samples =
            mic.distance_to(sx, sy, sz) / config.speed_of_sound * config.sample_rate as f32;
        let mut samples = delayed_sine(
            num_samples,
            config.sample_rate,
            source.frequency_hz,
            delay_samples,
            source.amplitude,
        );
        add_noise(&mut samples, source.snr_db, &mut rng);
        channels.push(samples);
    }

    AudioBuffer::from_channels(channels, config.sample_rate)
        .context("assembling synthetic audio buffer")
}
