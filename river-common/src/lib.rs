pub mod algorithms;
pub mod checkpoint;
mod error;
pub mod structures;
pub mod utils;

pub use error::{Result, TopologyError};
