// private sub-module defined in other files
mod coordinate_key;
mod point2d;
mod reach_graph;
mod reach_table;
mod segment;

// exports identifiers from private sub-modules in the current module namespace
pub use self::coordinate_key::{CoordinateKey, DEFAULT_PRECISION, MAX_PRECISION};
pub use self::point2d::{polyline_length, Point2D};
pub use self::reach_graph::{Downstream, ReachGraph, ReachId};
pub use self::reach_table::{
    parse_downstream, parse_reach_id, ReachTable, DEFAULT_DOWNSTREAM_FIELD, DEFAULT_ID_FIELD,
    ORDER_FIELD, THREAD_ID_FIELD,
};
pub use self::segment::{Segment, NO_BASIN};
