use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("wrong number of arguments")]
    Usage,

    #[error("invalid N_POSTINGS_PER_TERM {value:?}: {source}")]
    InvalidPostingsPerTerm {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog {}: {source}", .path.display())]
    Catalog {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("disk usage shrank from {previous} to {current} bytes")]
    DiskUsageShrank { previous: u64, current: u64 },

    #[error("corrupt posting data for term {term_id} at offset {offset}")]
    CorruptPostings { term_id: u32, offset: u64 },

    #[error("plotting failed: {0}")]
    Plot(String),
}
