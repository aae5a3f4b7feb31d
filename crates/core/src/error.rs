/// Errors raised by the pure helpers in this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A run date was not a `YYYY-MM-DD` calendar date.
    #[error("invalid run date '{value}': {reason}")]
    InvalidRunDate { value: String, reason: String },

    /// A run id would produce an unusable object key.
    #[error("invalid run id '{0}': must be non-empty and must not contain '/'")]
    InvalidRunId(String),
}
