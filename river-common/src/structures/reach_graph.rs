use std::collections::HashMap;

/// Identifier of one reach in a hydrography link table.
pub type ReachId = i64;

/// The downstream link of a reach.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Downstream {
    /// The reach is an outlet (the table stores `0`).
    Outlet,
    /// The table has no value for the link. Treated as an outlet for traversal,
    /// but kept apart so callers can report it as a data problem.
    Missing,
    Reach(ReachId),
}

impl Downstream {
    pub fn successor(&self) -> Option<ReachId> {
        match self {
            Downstream::Reach(id) => Some(*id),
            Downstream::Outlet | Downstream::Missing => None,
        }
    }
}

/// Directed reach-to-downstream-reach graph. Only reaches that take part in at
/// least one link are nodes, matching how the link table is read as an edge list.
#[derive(Clone, Debug, Default)]
pub struct ReachGraph {
    successors: HashMap<ReachId, Vec<ReachId>>,
    in_degree: HashMap<ReachId, usize>,
    edge_count: usize,
}

impl ReachGraph {
    pub fn new() -> ReachGraph {
        ReachGraph::default()
    }

    pub fn from_links<I>(links: I) -> ReachGraph
    where
        I: IntoIterator<Item = (ReachId, Downstream)>,
    {
        let mut graph = ReachGraph::new();
        for (from, downstream) in links {
            if let Some(to) = downstream.successor() {
                graph.add_link(from, to);
            }
        }
        graph
    }

    /// Adds the link `from -> to`. Repeated links are stored once.
    pub fn add_link(&mut self, from: ReachId, to: ReachId) {
        let out = self.successors.entry(from).or_default();
        if out.contains(&to) {
            return;
        }
        out.push(to);
        self.successors.entry(to).or_default();
        self.in_degree.entry(from).or_insert(0);
        *self.in_degree.entry(to).or_insert(0) += 1;
        self.edge_count += 1;
    }

    pub fn node_count(&self) -> usize {
        self.successors.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }

    pub fn contains(&self, id: ReachId) -> bool {
        self.successors.contains_key(&id)
    }

    /// Downstream neighbours in insertion order.
    pub fn successors(&self, id: ReachId) -> &[ReachId] {
        self.successors.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Headwater reaches (no incoming links), ascending by identifier. The
    /// ascending order is the total order used to break ties at confluences.
    pub fn sources(&self) -> Vec<ReachId> {
        let mut sources: Vec<ReachId> = self
            .in_degree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(&id, _)| id)
            .collect();
        sources.sort_unstable();
        sources
    }
}
