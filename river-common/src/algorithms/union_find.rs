use super::EndpointIndex;
use std::collections::HashMap;

/// Disjoint-set forest over segment positions `0..n`, owned by a single
/// labeling pass. Uses path compression and union by size.
#[derive(Clone, Debug)]
pub struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    pub fn new(n: usize) -> DisjointSet {
        DisjointSet {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Merges the sets holding `a` and `b`. Returns false if they were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        true
    }
}

/// Per-segment River_IDs for one batch and the first ID free for the next batch.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentLabels {
    pub river_ids: Vec<u64>,
    pub next_river_id: u64,
}

impl ComponentLabels {
    pub fn component_count(&self, starting_river_id: u64) -> u64 {
        self.next_river_id - starting_river_id
    }
}

/// Joins every segment sharing an endpoint key and numbers the resulting
/// components from `starting_river_id`. IDs are handed out while visiting
/// segments in ascending position, so the numbering does not depend on the
/// iteration order of `index`.
pub fn label_components(
    segment_count: usize,
    index: &EndpointIndex,
    starting_river_id: u64,
) -> ComponentLabels {
    let mut forest = DisjointSet::new(segment_count);
    for members in index.values() {
        if let Some((&first, rest)) = members.split_first() {
            for &other in rest {
                forest.union(first, other);
            }
        }
    }

    let mut root_ids: HashMap<usize, u64> = HashMap::new();
    let mut next_river_id = starting_river_id;
    let mut river_ids = Vec::with_capacity(segment_count);
    for i in 0..segment_count {
        let root = forest.find(i);
        let id = *root_ids.entry(root).or_insert_with(|| {
            let id = next_river_id;
            next_river_id += 1;
            id
        });
        river_ids.push(id);
    }

    ComponentLabels {
        river_ids,
        next_river_id,
    }
}
