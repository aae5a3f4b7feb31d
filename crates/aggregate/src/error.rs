use tag_inventory_core::CoreError;
use tag_inventory_storage::{
    ErrorKind, IdentityError, NotifyError, ObjectStoreError, SearchError,
};

/// Failure persisting or loading a [`Checkpoint`](crate::Checkpoint).
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("checkpoint is not valid JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors that abort an aggregation run.
///
/// Collaborator errors are wrapped, never rewritten, so the original kind
/// stays reachable through [`AggregationError::kind`] and `source()`.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("search step failed: {0}")]
    Search(#[from] SearchError),

    #[error("could not assume the central write role: {0}")]
    AssumeRole(#[from] IdentityError),

    #[error("could not write s3://{bucket}/{key}: {source}")]
    Upload {
        bucket: String,
        key: String,
        #[source]
        source: ObjectStoreError,
    },

    #[error("completion notification failed: {0}")]
    Notify(#[from] NotifyError),

    #[error("could not serialize tag groups: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid run: {0}")]
    InvalidRun(#[from] CoreError),

    #[error("checkpoint belongs to run '{found}', not '{expected}'")]
    ResumeMismatch { expected: String, found: String },

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("state machine fault: {0}")]
    Protocol(String),
}

impl AggregationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AggregationError::Search(e) => e.kind(),
            AggregationError::AssumeRole(e) => e.kind(),
            AggregationError::Upload { source, .. } => source.kind(),
            AggregationError::Notify(e) => e.kind(),
            AggregationError::Encode(_)
            | AggregationError::InvalidRun(_)
            | AggregationError::ResumeMismatch { .. } => ErrorKind::Invalid,
            AggregationError::Checkpoint(_) | AggregationError::Protocol(_) => ErrorKind::Other,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}
