use std::fmt;

/// Coarse classification shared by every collaborator error.
///
/// Pipelines decide what to do with a failure from its kind alone:
/// conflicts may mean "already done", transient kinds are the orchestrator's
/// to retry, access problems go back to an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Conflict,
    NotFound,
    Throttled,
    Timeout,
    AccessDenied,
    /// The caller's own credentials ran out; refreshing them fixes it.
    ExpiredCredentials,
    Invalid,
    Other,
}

impl ErrorKind {
    /// Worth retrying with backoff.
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::Throttled | ErrorKind::Timeout)
    }

    /// Needs a human (new credentials, a policy grant); never auto-retried.
    pub fn needs_operator(self) -> bool {
        matches!(self, ErrorKind::AccessDenied | ErrorKind::ExpiredCredentials)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Throttled => "throttled",
            ErrorKind::Timeout => "timeout",
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::ExpiredCredentials => "expired_credentials",
            ErrorKind::Invalid => "invalid",
            ErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// Errors from a [`ResourceSearch`](crate::ResourceSearch) backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("search throttled: {0}")]
    Throttled(String),
    #[error("search timed out: {0}")]
    Timeout(String),
    #[error("access denied searching view: {0}")]
    AccessDenied(String),
    #[error("view not found: {0}")]
    NotFound(String),
    #[error("invalid search request: {0}")]
    Validation(String),
    #[error("search failed: {0}")]
    Other(String),
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::Throttled(_) => ErrorKind::Throttled,
            SearchError::Timeout(_) => ErrorKind::Timeout,
            SearchError::AccessDenied(_) => ErrorKind::AccessDenied,
            SearchError::NotFound(_) => ErrorKind::NotFound,
            SearchError::Validation(_) => ErrorKind::Invalid,
            SearchError::Other(_) => ErrorKind::Other,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}

/// Errors from an [`ObjectStore`](crate::ObjectStore) backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },
    #[error("access denied to bucket '{bucket}': {message}")]
    AccessDenied { bucket: String, message: String },
    #[error("object storage throttled: {0}")]
    Throttled(String),
    #[error("object storage timed out: {0}")]
    Timeout(String),
    #[error("object storage error: {0}")]
    Other(String),
}

impl ObjectStoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ObjectStoreError::NotFound { .. } => ErrorKind::NotFound,
            ObjectStoreError::AccessDenied { .. } => ErrorKind::AccessDenied,
            ObjectStoreError::Throttled(_) => ErrorKind::Throttled,
            ObjectStoreError::Timeout(_) => ErrorKind::Timeout,
            ObjectStoreError::Other(_) => ErrorKind::Other,
        }
    }
}

/// Errors from a [`QueryEngine`](crate::QueryEngine) backend.
///
/// These cover the API calls themselves. A job that runs and ends `FAILED`
/// is not a `QueryError`; it is reported through
/// [`JobStatus`](crate::JobStatus).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("query engine throttled: {0}")]
    Throttled(String),
    #[error("query engine timed out: {0}")]
    Timeout(String),
    #[error("access denied by query engine: {0}")]
    AccessDenied(String),
    #[error("query execution not found: {0}")]
    NotFound(String),
    #[error("invalid query request: {0}")]
    InvalidRequest(String),
    #[error("query engine error: {0}")]
    Other(String),
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::Throttled(_) => ErrorKind::Throttled,
            QueryError::Timeout(_) => ErrorKind::Timeout,
            QueryError::AccessDenied(_) => ErrorKind::AccessDenied,
            QueryError::NotFound(_) => ErrorKind::NotFound,
            QueryError::InvalidRequest(_) => ErrorKind::Invalid,
            QueryError::Other(_) => ErrorKind::Other,
        }
    }
}

/// Errors assuming a cross-account role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("access denied assuming role '{role_arn}': {message}")]
    AccessDenied { role_arn: String, message: String },
    #[error("caller credentials expired: {0}")]
    ExpiredCredentials(String),
    #[error("identity service throttled: {0}")]
    Throttled(String),
    #[error("identity service error: {0}")]
    Other(String),
}

impl IdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::AccessDenied { .. } => ErrorKind::AccessDenied,
            IdentityError::ExpiredCredentials(_) => ErrorKind::ExpiredCredentials,
            IdentityError::Throttled(_) => ErrorKind::Throttled,
            IdentityError::Other(_) => ErrorKind::Other,
        }
    }
}

/// Errors publishing a notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("topic not found: {0}")]
    TopicNotFound(String),
    #[error("access denied publishing to topic: {0}")]
    AccessDenied(String),
    #[error("notification service throttled: {0}")]
    Throttled(String),
    #[error("notification error: {0}")]
    Other(String),
}

impl NotifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NotifyError::TopicNotFound(_) => ErrorKind::NotFound,
            NotifyError::AccessDenied(_) => ErrorKind::AccessDenied,
            NotifyError::Throttled(_) => ErrorKind::Throttled,
            NotifyError::Other(_) => ErrorKind::Other,
        }
    }
}

/// Errors from an [`IndexAdmin`](crate::IndexAdmin) backend.
///
/// `Conflict` is what the index service answers when the requested resource
/// already exists or is already in the requested state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("throttled: {0}")]
    Throttled(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("{0}")]
    Other(String),
}

impl IndexError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IndexError::Conflict(_) => ErrorKind::Conflict,
            IndexError::NotFound(_) => ErrorKind::NotFound,
            IndexError::AccessDenied(_) => ErrorKind::AccessDenied,
            IndexError::Throttled(_) => ErrorKind::Throttled,
            IndexError::Timeout(_) => ErrorKind::Timeout,
            IndexError::Other(_) => ErrorKind::Other,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, IndexError::Conflict(_))
    }
}
