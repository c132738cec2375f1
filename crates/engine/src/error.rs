use thiserror::Error;

use crate::provider::ProviderFormat;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Registering a second adapter for the same format.
    #[error("provider adapter already registered: {0}")]
    DuplicateProvider(ProviderFormat),

    /// A provider name that is not a known format identifier.
    #[error("unknown provider: \"{0}\"")]
    UnknownProvider(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Malformed directed-merge input. Recoverable: the caller re-prompts or skips.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// Entry numbers are 1-based, as shown to the user.
    #[error("entry {index} is out of range (choose 1-{len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("\"{0}\" is not a number")]
    NotANumber(String),

    #[error("entry {0} was chosen twice; pick two different entries")]
    DuplicateIndexPair(usize),

    #[error("\"{0}\" is not a yes/no value")]
    InvalidBool(String),

    #[error("unrecognized choice \"{0}\"")]
    UnknownChoice(String),
}
