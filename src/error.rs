//! Error type shared by ingestion, indexing and the data model facade.

use thiserror::Error;

/// Errors produced while populating or querying a frame timeline.
#[derive(Debug, Error)]
pub enum TimelineError {
    /// The report was malformed, incomplete or could not be read.
    #[error("failed to parse report: {reason}")]
    Parse { reason: Box<str> },

    /// The report decoded successfully but described no frames.
    #[error("report contains no frames")]
    EmptyDataset,

    /// A query was issued before a population completed successfully.
    #[error("timeline has not been populated")]
    NotPopulated,

    /// Channel selector outside `{0, 1}`.
    #[error("invalid channel {channel}: expected 0 (odd field) or 1 (even field)")]
    InvalidChannel { channel: i32 },

    /// The population worker thread could not be started.
    #[error("failed to start population worker: {reason}")]
    Spawn { reason: Box<str> },

    /// Options could not be decoded.
    #[error("invalid configuration: {reason}")]
    Config { reason: Box<str> },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TimelineError {
    pub(crate) fn parse(reason: impl Into<Box<str>>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }
}

/// Convenient result alias.
pub type Result<T> = std::result::Result<T, TimelineError>;
