//! Crash-safe, resumable thread assignment over a reach graph.

mod driver;
mod store;

pub use self::driver::{
    ChunkProgress, CheckpointedDriver, DriverState, RunStatus, TraversalConfig, DEFAULT_CHUNK_SIZE,
};
pub use self::store::{CheckpointStore, CommittedState, CHECKPOINT_HEADER};
