// private sub-module defined in other files
mod basin_topology;
mod endpoint_connectivity;
mod reach_traversal;
mod thread_distance;
mod union_find;

// exports identifiers from private sub-modules in the current module namespace
pub use self::basin_topology::{
    reconstruct_basin, reconstruct_streams, BasinSummary, BasinTopology, StreamTopology,
};
pub use self::endpoint_connectivity::{
    build_endpoint_index, extract_endpoints, EndpointIndex, SegmentEndpoints,
};
pub use self::reach_traversal::{
    assign_threads, thread_label, traverse_from_source, ThreadAssignment,
};
pub use self::thread_distance::cumulative_distances;
pub use self::union_find::{label_components, ComponentLabels, DisjointSet};
