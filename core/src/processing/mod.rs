pub mod buffer_pool;
pub mod framer;
pub mod gcc_phat;
pub mod pipeline;
pub mod srp_map;

pub use buffer_pool::BufferPool;
pub use framer::{AudioBuffer, Frame, Framer};
pub use gcc_phat::GccPhatEngine;
pub use pipeline::{FrameAnalysis, Pipeline};
pub use srp_map::{SrpEngine, SrpPeak, TauTable};
