use super::{build_endpoint_index, cumulative_distances, extract_endpoints, label_components};
use crate::error::{Result, TopologyError};
use crate::structures::{Segment, NO_BASIN};
use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Thread labels and distances for one basin batch, indexed by batch position.
#[derive(Clone, Debug, PartialEq)]
pub struct BasinTopology {
    pub river_ids: Vec<u64>,
    pub lengths: Vec<f64>,
    pub cumulative_distances: Vec<f64>,
    pub next_river_id: u64,
    pub sentinel_segments: usize,
}

/// Runs endpoint extraction, component labeling and distance assignment over
/// a single basin batch.
pub fn reconstruct_basin<S: Borrow<Segment>>(
    segments: &[S],
    starting_river_id: u64,
    precision: u32,
) -> BasinTopology {
    let endpoints = extract_endpoints(segments, precision);
    let sentinel_segments = endpoints.iter().filter(|e| e.is_sentinel()).count();
    let index = build_endpoint_index(&endpoints);
    let labels = label_components(segments.len(), &index, starting_river_id);
    let lengths: Vec<f64> = segments.iter().map(|s| s.borrow().length()).collect();
    let cumulative_distances = cumulative_distances(&lengths, &labels.river_ids);
    BasinTopology {
        river_ids: labels.river_ids,
        lengths,
        cumulative_distances,
        next_river_id: labels.next_river_id,
        sentinel_segments,
    }
}

/// Segment and thread counts for one basin group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BasinSummary {
    pub basin_group: u32,
    pub segments: usize,
    pub river_networks: u64,
}

/// Topology for a whole segment collection, in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StreamTopology {
    pub river_ids: Vec<u64>,
    pub lengths: Vec<f64>,
    pub cumulative_distances: Vec<f64>,
    pub basins: Vec<BasinSummary>,
    pub unassigned_segments: usize,
    pub sentinel_segments: usize,
}

impl StreamTopology {
    pub fn river_network_count(&self) -> u64 {
        self.basins.iter().map(|b| b.river_networks).sum()
    }

    pub fn max_cumulative_distance(&self) -> f64 {
        self.cumulative_distances
            .iter()
            .copied()
            .fold(0.0, f64::max)
    }
}

/// Splits `segments` by basin group, reconstructs each basin in ascending
/// group order and threads the River_ID counter (starting at 1) from one basin
/// to the next. Basin 0 segments keep River_ID 0 and distance 0.0.
///
/// Fails with `NoBasins` when there are segments but none belongs to a basin.
pub fn reconstruct_streams(segments: &[Segment], precision: u32) -> Result<StreamTopology> {
    let n = segments.len();
    let mut topology = StreamTopology {
        river_ids: vec![0; n],
        lengths: vec![0.0; n],
        cumulative_distances: vec![0.0; n],
        ..Default::default()
    };

    let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, seg) in segments.iter().enumerate() {
        if seg.basin_group == NO_BASIN {
            topology.unassigned_segments += 1;
            topology.lengths[i] = seg.length();
        } else {
            groups.entry(seg.basin_group).or_default().push(i);
        }
    }
    if n > 0 && groups.is_empty() {
        return Err(TopologyError::NoBasins);
    }
    if topology.unassigned_segments > 0 {
        tracing::warn!(
            segments = topology.unassigned_segments,
            "segments don't intersect any basin and are left unlabeled"
        );
    }

    let mut next_river_id = 1u64;
    for (basin_group, members) in groups {
        let batch: Vec<&Segment> = members.iter().map(|&i| &segments[i]).collect();
        let basin = reconstruct_basin(&batch, next_river_id, precision);
        tracing::debug!(
            basin_group,
            segments = batch.len(),
            river_networks = basin.next_river_id - next_river_id,
            "basin reconstructed"
        );
        for (pos, &i) in members.iter().enumerate() {
            topology.river_ids[i] = basin.river_ids[pos];
            topology.lengths[i] = basin.lengths[pos];
            topology.cumulative_distances[i] = basin.cumulative_distances[pos];
        }
        topology.sentinel_segments += basin.sentinel_segments;
        topology.basins.push(BasinSummary {
            basin_group,
            segments: members.len(),
            river_networks: basin.next_river_id - next_river_id,
        });
        next_river_id = basin.next_river_id;
    }

    Ok(topology)
}
