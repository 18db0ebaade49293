use super::CheckpointStore;
use crate::algorithms::{thread_label, traverse_from_source, ThreadAssignment};
use crate::error::{Result, TopologyError};
use crate::structures::{ReachGraph, ReachId};
use std::collections::{HashMap, HashSet};
use std::io;

pub const DEFAULT_CHUNK_SIZE: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraversalConfig {
    /// Number of sources traversed between two checkpoint commits.
    pub chunk_size: usize,
}

impl Default for TraversalConfig {
    fn default() -> TraversalConfig {
        TraversalConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Lifecycle of a checkpointed run:
/// `Idle -> ChunkInProgress -> ChunkCommitted -> (ChunkInProgress | Done)`.
/// `ChunkCommitted` is entered only after the chunk is synced to the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    ChunkInProgress { chunk: u64 },
    ChunkCommitted { chunk: u64 },
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Stopped after the requested number of chunks with sources left over.
    Interrupted,
    Complete,
}

/// Reported to the caller after every committed chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkProgress {
    pub chunk: u64,
    pub rows: usize,
    pub sources_processed: usize,
    pub sources_pending: usize,
}

/// Traverses a reach graph source by source in fixed-size chunks, persisting
/// each chunk before moving on, and resumes from whatever an earlier run
/// committed to the same store.
pub struct CheckpointedDriver<'a> {
    graph: &'a ReachGraph,
    store: CheckpointStore,
    config: TraversalConfig,
    state: DriverState,
    // (1-based ordinal among all sources, source id)
    work: Vec<(usize, ReachId)>,
    next_work: usize,
    visited: HashSet<ReachId>,
    chunks_committed: u64,
    sources_total: usize,
}

impl<'a> CheckpointedDriver<'a> {
    /// Loads `store` and drops every source it already covers from the work
    /// list. The committed reaches also seed the run-wide visited set, so the
    /// remaining traversals stop exactly where a single uninterrupted run would.
    pub fn resume(
        graph: &'a ReachGraph,
        store: CheckpointStore,
        config: TraversalConfig,
    ) -> Result<CheckpointedDriver<'a>> {
        if config.chunk_size == 0 {
            return Err(TopologyError::InvalidChunkSize);
        }
        let sources = graph.sources();
        if sources.is_empty() && !graph.is_empty() {
            return Err(TopologyError::NoSources {
                node_count: graph.node_count(),
            });
        }

        let committed = store.load()?;
        let visited = committed.assigned_ids();
        let unknown = visited.iter().filter(|id| !graph.contains(**id)).count();
        if unknown > 0 {
            tracing::warn!(
                path = %store.path().display(),
                reaches = unknown,
                "checkpoint store names reaches missing from the input graph"
            );
        }

        let work: Vec<(usize, ReachId)> = sources
            .iter()
            .enumerate()
            .filter(|(_, s)| !visited.contains(*s))
            .map(|(i, &s)| (i + 1, s))
            .collect();
        if committed.chunks_committed > 0 {
            tracing::info!(
                chunks = committed.chunks_committed,
                reaches = visited.len(),
                sources_done = sources.len() - work.len(),
                sources_left = work.len(),
                "resuming from checkpoint"
            );
        }

        Ok(CheckpointedDriver {
            graph,
            store,
            config,
            state: DriverState::Idle,
            work,
            next_work: 0,
            visited,
            chunks_committed: committed.chunks_committed,
            sources_total: sources.len(),
        })
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn sources_total(&self) -> usize {
        self.sources_total
    }

    /// Sources already covered by the checkpoint when the driver was created.
    pub fn sources_resumed(&self) -> usize {
        self.sources_total - self.work.len()
    }

    pub fn sources_pending(&self) -> usize {
        self.work.len() - self.next_work
    }

    pub fn run<F: FnMut(&ChunkProgress)>(&mut self, progress: F) -> Result<()> {
        self.run_chunks(None, progress).map(|_| ())
    }

    /// Processes at most `max_chunks` chunks (all of them for `None`).
    pub fn run_chunks<F: FnMut(&ChunkProgress)>(
        &mut self,
        max_chunks: Option<usize>,
        mut progress: F,
    ) -> Result<RunStatus> {
        if let DriverState::ChunkInProgress { chunk } = self.state {
            // an earlier chunk failed to commit; the in-memory visited set is ahead of the store
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("chunk {} never committed; resume from the checkpoint store", chunk),
            )
            .into());
        }
        let mut processed = 0usize;
        loop {
            if self.next_work >= self.work.len() {
                if self.state != DriverState::Done {
                    self.transition(DriverState::Done);
                }
                return Ok(RunStatus::Complete);
            }
            if max_chunks.map_or(false, |max| processed >= max) {
                return Ok(RunStatus::Interrupted);
            }
            let p = self.process_next_chunk()?;
            progress(&p);
            processed += 1;
        }
    }

    fn process_next_chunk(&mut self) -> Result<ChunkProgress> {
        let chunk = self.chunks_committed + 1;
        self.transition(DriverState::ChunkInProgress { chunk });

        let end = (self.next_work + self.config.chunk_size).min(self.work.len());
        let mut rows: Vec<ThreadAssignment> = vec![];
        for &(ordinal, source) in &self.work[self.next_work..end] {
            traverse_from_source(
                self.graph,
                source,
                &thread_label(ordinal),
                &mut self.visited,
                &mut rows,
            );
        }
        let mut seen = HashSet::with_capacity(rows.len());
        rows.retain(|r| seen.insert(r.reach_id));

        self.store.commit_chunk(chunk, &rows)?;
        self.chunks_committed = chunk;
        self.next_work = end;
        self.transition(DriverState::ChunkCommitted { chunk });
        tracing::debug!(chunk, rows = rows.len(), "checkpoint chunk committed");

        Ok(ChunkProgress {
            chunk,
            rows: rows.len(),
            sources_processed: self.next_work,
            sources_pending: self.sources_pending(),
        })
    }

    fn transition(&mut self, next: DriverState) {
        use DriverState::*;
        debug_assert!(
            matches!(
                (self.state, next),
                (Idle, ChunkInProgress { .. })
                    | (ChunkInProgress { .. }, ChunkCommitted { .. })
                    | (ChunkCommitted { .. }, ChunkInProgress { .. })
                    | (Idle, Done)
                    | (ChunkCommitted { .. }, Done)
            ),
            "illegal driver transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    /// Reads every committed assignment back from the store, keyed by reach.
    /// Only available once the run is `Done`, so the result is always complete.
    pub fn committed_assignments(&self) -> Result<HashMap<ReachId, ThreadAssignment>> {
        if self.state != DriverState::Done {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "traversal has not finished; assignments are incomplete",
            )
            .into());
        }
        let committed = self.store.load()?;
        Ok(committed
            .assignments
            .into_iter()
            .map(|a| (a.reach_id, a))
            .collect())
    }

    /// Deletes the checkpoint store. Call after the merged output is durable.
    pub fn complete(self) -> Result<()> {
        if self.state != DriverState::Done {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "refusing to remove the checkpoint store of an unfinished run",
            )
            .into());
        }
        self.store.remove()
    }
}
