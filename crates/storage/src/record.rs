use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// One call to the paginated resource search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub view_arn: String,
    /// Search query; empty matches every resource visible through the view.
    pub query_string: String,
    pub max_results: i32,
    pub next_token: Option<String>,
}

/// An object to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    /// Base64 SHA-256 of `body`; backends that support it verify on receipt.
    pub checksum_sha256: Option<String>,
}

/// Short-lived credentials returned by a role assumption.
///
/// Scoped to a single run and never cached across runs. `Debug` redacts the
/// secret parts.
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: Option<SystemTime>,
}

impl fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Lifecycle state of a query-engine job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Cancelled
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Queued => "QUEUED",
            JobState::Running => "RUNNING",
            JobState::Succeeded => "SUCCEEDED",
            JobState::Failed => "FAILED",
            JobState::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Result of polling a job once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    /// `s3://` URI of the data manifest, for statements that write rows.
    pub manifest_location: Option<String>,
    /// Engine-reported reason for a failed or cancelled job.
    pub error_detail: Option<String>,
}

impl JobStatus {
    pub fn new(state: JobState) -> Self {
        JobStatus {
            state,
            manifest_location: None,
            error_detail: None,
        }
    }
}

/// Data rows of a finished query (header row already removed), each a list
/// of nullable column values.
pub type ResultRows = Vec<Vec<Option<String>>>;

/// Role of a regional resource index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexType {
    Local,
    Aggregator,
}

/// One page of view ARNs from a view listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewPage {
    pub view_arns: Vec<String>,
    pub next_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_redacts_secrets() {
        let creds = TemporaryCredentials {
            access_key_id: "ASIAEXAMPLE".into(),
            secret_access_key: "super-secret".into(),
            session_token: "token-value".into(),
            expiration: None,
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("ASIAEXAMPLE"));
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("token-value"));
    }

    #[test]
    fn only_final_states_are_terminal() {
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
    }
}
