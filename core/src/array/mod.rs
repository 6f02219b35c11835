pub mod geometry;
pub mod pairs;

pub use geometry::{MicArray, MicPosition};
pub use pairs::MicPairs;
