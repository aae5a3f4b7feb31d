use tag_inventory_storage::{ErrorKind, JobState, ObjectStoreError, QueryError};

use crate::step::ReportStep;

/// Errors that abort a report run. Each names the step it stopped at.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("{step}: could not submit statement: {source}")]
    Submit {
        step: ReportStep,
        #[source]
        source: QueryError,
    },

    #[error("{step}: could not read job status: {source}")]
    Status {
        step: ReportStep,
        #[source]
        source: QueryError,
    },

    #[error("{step}: job ended {state}{}", detail_suffix(.detail))]
    JobFailed {
        step: ReportStep,
        state: JobState,
        detail: Option<String>,
    },

    #[error("{step}: execution took too long ({attempts} polls without a terminal state)")]
    TookTooLong { step: ReportStep, attempts: u32 },

    #[error("{step}: poll budget must allow at least one status check")]
    NoPollBudget { step: ReportStep },

    #[error("{step}: could not read query results: {source}")]
    Results {
        step: ReportStep,
        #[source]
        source: QueryError,
    },

    #[error("{step}: latest partition '{value}' is not a YYYY-MM-DD date")]
    InvalidPartitionDate { step: ReportStep, value: String },

    #[error("CreateCsvResultTable: job reported no data manifest location")]
    ManifestMissing,

    #[error("Could not determine data file location: '{0}'")]
    DataFileLocation(String),

    #[error("not an s3:// object location: '{0}'")]
    InvalidLocation(String),

    #[error("{step}: object storage failed: {source}")]
    Storage {
        step: ReportStep,
        #[source]
        source: ObjectStoreError,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

impl ReportError {
    pub fn step(&self) -> Option<ReportStep> {
        match self {
            ReportError::Submit { step, .. }
            | ReportError::Status { step, .. }
            | ReportError::JobFailed { step, .. }
            | ReportError::TookTooLong { step, .. }
            | ReportError::NoPollBudget { step }
            | ReportError::Results { step, .. }
            | ReportError::InvalidPartitionDate { step, .. }
            | ReportError::Storage { step, .. } => Some(*step),
            ReportError::ManifestMissing => Some(ReportStep::CreateCsvResultTable),
            ReportError::DataFileLocation(_) => Some(ReportStep::ExtractManifest),
            ReportError::InvalidLocation(_) => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ReportError::Submit { source, .. }
            | ReportError::Status { source, .. }
            | ReportError::Results { source, .. } => source.kind(),
            ReportError::Storage { source, .. } => source.kind(),
            ReportError::TookTooLong { .. } => ErrorKind::Timeout,
            ReportError::InvalidPartitionDate { .. }
            | ReportError::NoPollBudget { .. }
            | ReportError::DataFileLocation(_)
            | ReportError::InvalidLocation(_) => ErrorKind::Invalid,
            ReportError::JobFailed { .. } | ReportError::ManifestMissing => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_failure_message_names_step_and_reason() {
        let err = ReportError::JobFailed {
            step: ReportStep::CreateExternalTable,
            state: JobState::Failed,
            detail: Some("HIVE_METASTORE_ERROR".into()),
        };
        assert_eq!(
            err.to_string(),
            "CreateExternalTable: job ended FAILED: HIVE_METASTORE_ERROR"
        );
        assert_eq!(err.step(), Some(ReportStep::CreateExternalTable));
    }

    #[test]
    fn poll_exhaustion_reads_took_too_long() {
        let err = ReportError::TookTooLong {
            step: ReportStep::LoadPartitions,
            attempts: 6,
        };
        assert!(err.to_string().contains("took too long"));
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }
}
