pub mod fft;
pub mod stats;

pub use fft::FftEngine;
pub use stats::StatsHelper;
