use crate::algorithms::ThreadAssignment;
use crate::error::{Result, TopologyError};
use crate::structures::ReachId;
use csv::ByteRecord;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

pub const CHECKPOINT_HEADER: [&str; 3] = ["HYRIV_ID", "River_ID", "Order"];
const COMMIT_MARKER: &str = "#commit";

/// Everything a checkpoint store holds up to its last commit marker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommittedState {
    pub assignments: Vec<ThreadAssignment>,
    pub chunks_committed: u64,
    /// Rows found after the last commit marker and thrown away.
    pub discarded_rows: usize,
}

impl CommittedState {
    pub fn assigned_ids(&self) -> HashSet<ReachId> {
        self.assignments.iter().map(|a| a.reach_id).collect()
    }
}

/// Append-only CSV log of thread assignments.
///
/// Each chunk is appended as its rows followed by a `#commit,<chunk>,<rows>`
/// record, then the file is synced. Only rows covered by a commit marker count
/// as progress; a tail without one is what an interrupted write leaves behind.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new<P: AsRef<Path>>(path: P) -> CheckpointStore {
        CheckpointStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the committed region. An uncommitted tail is truncated away with a
    /// warning. Anything wrong inside the committed region is `CheckpointCorrupt`.
    pub fn load(&self) -> Result<CommittedState> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CommittedState::default()),
            Err(e) => return Err(e.into()),
        };
        let file_len = file.metadata()?.len();
        let terminated = ends_with_newline(&mut file, file_len)?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut state = CommittedState::default();
        let mut committed_ids: HashSet<ReachId> = HashSet::new();
        let mut pending: Vec<ThreadAssignment> = vec![];
        let mut pending_error: Option<(u64, String)> = None;
        let mut header_ok = false;
        let mut committed_end = 0u64;
        let mut record = ByteRecord::new();
        let mut record_no = 0u64;
        let mut cut_marker = false;

        while rdr.read_byte_record(&mut record)? {
            record_no += 1;
            if record_no == 1 {
                header_ok = record.iter().eq(CHECKPOINT_HEADER.iter().map(|h| h.as_bytes()));
                committed_end = rdr.position().byte();
                continue;
            }
            if record.get(0) != Some(COMMIT_MARKER.as_bytes()) {
                if pending_error.is_none() {
                    match record.deserialize::<ThreadAssignment>(None) {
                        Ok(row) => pending.push(row),
                        Err(e) => pending_error = Some((record_no, e.to_string())),
                    }
                }
                continue;
            }
            if !terminated && rdr.position().byte() >= file_len {
                // the marker itself was cut off mid-write
                cut_marker = true;
                break;
            }

            let corrupt = |reason: String| TopologyError::CheckpointCorrupt {
                path: self.path.clone(),
                record: record_no,
                reason,
            };
            if !header_ok {
                return Err(corrupt("header does not match HYRIV_ID,River_ID,Order".to_string()));
            }
            if let Some((bad_record, reason)) = pending_error.take() {
                return Err(TopologyError::CheckpointCorrupt {
                    path: self.path.clone(),
                    record: bad_record,
                    reason,
                });
            }
            let field = |i: usize| {
                record
                    .get(i)
                    .and_then(|f| std::str::from_utf8(f).ok())
                    .and_then(|f| f.trim().parse::<u64>().ok())
            };
            let (chunk, rows) = match (field(1), field(2)) {
                (Some(c), Some(r)) => (c, r),
                _ => return Err(corrupt("unreadable commit marker".to_string())),
            };
            if chunk != state.chunks_committed + 1 {
                return Err(corrupt(format!(
                    "commit marker for chunk {} follows chunk {}",
                    chunk, state.chunks_committed
                )));
            }
            if rows != pending.len() as u64 {
                return Err(corrupt(format!(
                    "chunk {} declares {} rows but {} precede its marker",
                    chunk,
                    rows,
                    pending.len()
                )));
            }
            for row in pending.drain(..) {
                if !committed_ids.insert(row.reach_id) {
                    return Err(corrupt(format!(
                        "reach {} is assigned in more than one chunk",
                        row.reach_id
                    )));
                }
                state.assignments.push(row);
            }
            state.chunks_committed = chunk;
            committed_end = rdr.position().byte();
        }

        let tail_rows = pending.len() + usize::from(pending_error.is_some());
        if state.chunks_committed == 0 {
            // nothing durable was ever written; header included
            drop(rdr);
            fs::remove_file(&self.path)?;
            if tail_rows > 0 || !header_ok {
                tracing::warn!(
                    path = %self.path.display(),
                    rows = tail_rows,
                    "checkpoint store holds no committed chunk; discarding it"
                );
            }
            state.discarded_rows = tail_rows;
            return Ok(state);
        }
        if tail_rows > 0 || cut_marker {
            drop(rdr);
            tracing::warn!(
                path = %self.path.display(),
                rows = tail_rows,
                chunks = state.chunks_committed,
                "discarding uncommitted checkpoint tail from an interrupted run"
            );
            let file = OpenOptions::new().write(true).open(&self.path)?;
            file.set_len(committed_end)?;
            file.sync_all()?;
            state.discarded_rows = tail_rows;
        }
        Ok(state)
    }

    /// Appends one chunk and its commit marker, creating the store with its
    /// header on first use. Returns only once the data is synced to disk.
    pub fn commit_chunk(&mut self, chunk: u64, rows: &[ThreadAssignment]) -> Result<()> {
        let is_new = !self.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            wtr.write_record(CHECKPOINT_HEADER)?;
        }
        for row in rows {
            wtr.serialize(row)?;
        }
        let chunk = chunk.to_string();
        let count = rows.len().to_string();
        wtr.write_record([COMMIT_MARKER, chunk.as_str(), count.as_str()])?;
        wtr.flush()?;
        let file = wtr.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }

    /// Deletes the store once its content has been merged into the output.
    pub fn remove(self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn ends_with_newline(file: &mut File, len: u64) -> io::Result<bool> {
    if len == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    file.seek(SeekFrom::Start(0))?;
    Ok(last[0] == b'\n')
}
