//! Core signal processing for the Rust acoustic source-localization
//! platform.
//!
//! The per-frame flow is framing/windowing, per-channel FFT, pairwise
//! GCC-PHAT, then steered-response-power projection onto a spherical grid
//! through a precomputed delay table. Every shared table (window, twiddle
//! factors, pair enumeration, Tau table) is built once up front and read
//! immutably afterwards.

pub mod array;
pub mod math;
pub mod persist;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use prelude::{GridSpec, PipelineConfig, PipelineError, PipelineResult};
pub use processing::{AudioBuffer, FrameAnalysis, Pipeline};
