use crate::structures::{ReachGraph, ReachId};
use serde_derive::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Thread label and breadth-first order assigned to one reach.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadAssignment {
    #[serde(rename = "HYRIV_ID")]
    pub reach_id: ReachId,
    #[serde(rename = "River_ID")]
    pub thread_id: String,
    #[serde(rename = "Order")]
    pub order: u32,
}

/// Label for the source at 1-based position `ordinal` in the sorted source list.
pub fn thread_label(ordinal: usize) -> String {
    format!("River_{}", ordinal)
}

/// Breadth-first walk downstream from `source`, labelling every reach not yet
/// in `visited` with `thread_id` and its hop count from the source.
///
/// `visited` spans all sources processed so far in the run, so a confluence
/// belongs to whichever source reaches it first, and a cycle is walked once.
/// The walk does not continue past an already visited reach: everything
/// downstream of it was labelled by the traversal that got there first.
pub fn traverse_from_source(
    graph: &ReachGraph,
    source: ReachId,
    thread_id: &str,
    visited: &mut HashSet<ReachId>,
    out: &mut Vec<ThreadAssignment>,
) -> usize {
    if !visited.insert(source) {
        return 0;
    }
    let before = out.len();
    let mut queue: VecDeque<(ReachId, u32)> = VecDeque::new();
    queue.push_back((source, 0));
    while let Some((reach, order)) = queue.pop_front() {
        out.push(ThreadAssignment {
            reach_id: reach,
            thread_id: thread_id.to_string(),
            order,
        });
        for &next in graph.successors(reach) {
            if visited.insert(next) {
                queue.push_back((next, order + 1));
            }
        }
    }
    out.len() - before
}

/// Labels the whole graph in one pass: every source in ascending id order,
/// sharing one visited set.
pub fn assign_threads(graph: &ReachGraph) -> Vec<ThreadAssignment> {
    let mut visited = HashSet::with_capacity(graph.node_count());
    let mut out = Vec::with_capacity(graph.node_count());
    for (i, source) in graph.sources().into_iter().enumerate() {
        traverse_from_source(graph, source, &thread_label(i + 1), &mut visited, &mut out);
    }
    out
}
