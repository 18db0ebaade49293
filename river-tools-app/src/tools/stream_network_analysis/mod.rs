// private sub-module defined in other files
mod assign_reach_threads;
mod reconstruct_stream_topology;

// exports identifiers from private sub-modules in the current module namespace
pub use self::assign_reach_threads::AssignReachThreads;
pub use self::reconstruct_stream_topology::ReconstructStreamTopology;
