use std::path::PathBuf;

use thiserror::Error;

use creddedupe_engine::{EngineError, ProviderFormat};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV file has no header row")]
    NoHeaders,

    /// The chosen adapter needs columns the file does not have.
    #[error("input is missing required {format} columns: {}", missing.join(", "))]
    MissingColumns {
        format: ProviderFormat,
        missing: Vec<String>,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
