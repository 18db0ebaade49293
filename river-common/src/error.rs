use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the topology reconstruction engine.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("required column '{0}' is missing from the input table")]
    MissingColumn(String),

    #[error("invalid value '{value}' in column '{column}' at data row {row}")]
    InvalidField {
        row: usize,
        column: String,
        value: String,
    },

    #[error("the input contains no data rows")]
    EmptyInput,

    /// Every node of a non-empty graph has an incoming link, which means the
    /// network is cyclic; reported apart from `EmptyInput` on purpose.
    #[error("no source reaches found among {node_count} linked reaches (cyclic network?)")]
    NoSources { node_count: usize },

    #[error("no basin groups present: every segment is unassigned (basin 0)")]
    NoBasins,

    #[error("checkpoint store {} is corrupt at record {record}: {reason}; repair or delete it before rerunning", path.display())]
    CheckpointCorrupt {
        path: PathBuf,
        record: u64,
        reason: String,
    },

    #[error("chunk size must be at least 1")]
    InvalidChunkSize,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl From<TopologyError> for io::Error {
    fn from(err: TopologyError) -> io::Error {
        match err {
            TopologyError::Io(e) => e,
            TopologyError::MissingColumn(_)
            | TopologyError::InvalidField { .. }
            | TopologyError::EmptyInput
            | TopologyError::InvalidChunkSize => {
                io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
            }
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, TopologyError>;
