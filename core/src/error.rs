use crate::types::Tick;
use thiserror::Error;

/// Infrastructure failures. Action outcomes are never reported here;
/// they are `ResultCode` values.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot read config {path}: {source}")]
    ConfigIo {
        path:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown entity '{id}'")]
    UnknownEntity { id: String },

    #[error("Run not initialized")]
    RunNotInitialized,

    #[error("No tick in progress; call begin_tick first")]
    NoTickInProgress,

    #[error("Tick {tick} is still in progress")]
    TickInProgress { tick: Tick },

    #[error("Snapshot for run '{expected}' cannot be restored into run '{actual}'")]
    SnapshotMismatch { expected: String, actual: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
