use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MartError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Can't load link list \"{path}\": {reason}")]
    LinkListRead { path: PathBuf, reason: String },

    #[error("Link list \"{path}\" contains undecodable lines:\n{details}")]
    LinkListDecode { path: PathBuf, details: String },

    #[error("Invalid command line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("Unknown {kind} \"{value}\", expected one of: {expected}")]
    UnknownVariant {
        kind: &'static str,
        value: String,
        expected: String,
    },

    #[error("Queue row {row} is out of range (queue has {len} entries)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("Queue entry {row} has no output document")]
    NoOutputDocument { row: usize },

    #[error("The queue cannot be restructured while a run is in progress")]
    RunInProgress,

    #[error("Failed to initialize worker pool: {reason}")]
    WorkerPool { reason: String },

    #[error("{failed} of {total} items failed to process")]
    ItemsFailed { failed: usize, total: usize },

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
