use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tag_inventory_storage::{JobState, JobStatus, QueryEngine};
use tracing::{debug, error, info};

use crate::error::ReportError;
use crate::step::ReportStep;

/// How long to wait for a job: a fixed interval between status polls and a
/// bound on the number of polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollPolicy {
    #[serde(rename = "interval_secs", deserialize_with = "seconds")]
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: Duration::from_secs(3),
            max_attempts: 6,
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        PollPolicy {
            interval,
            max_attempts,
        }
    }
}

fn seconds<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    Ok(Duration::from_secs(u64::deserialize(d)?))
}

/// A job that reached `SUCCEEDED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedJob {
    pub execution_id: String,
    pub status: JobStatus,
}

/// Submit `query`, poll it to a terminal state and require success.
///
/// Any terminal state other than `SUCCEEDED` is [`ReportError::JobFailed`];
/// running out of polls is [`ReportError::TookTooLong`]. A policy with no
/// polls is refused before anything is submitted.
pub async fn run_job(
    engine: &dyn QueryEngine,
    step: ReportStep,
    query: &str,
    work_group: &str,
    policy: PollPolicy,
) -> Result<CompletedJob, ReportError> {
    if policy.max_attempts == 0 {
        return Err(ReportError::NoPollBudget { step });
    }
    info!(step = %step, "submitting statement");
    debug!(step = %step, query, "statement text");
    let execution_id = engine
        .submit(query, work_group)
        .await
        .map_err(|source| ReportError::Submit { step, source })?;

    for attempt in 1..=policy.max_attempts {
        let status = engine
            .get_status(&execution_id)
            .await
            .map_err(|source| ReportError::Status { step, source })?;
        debug!(step = %step, execution_id = %execution_id, attempt, state = %status.state, "polled job");

        match status.state {
            JobState::Succeeded => {
                info!(step = %step, execution_id = %execution_id, "job succeeded");
                return Ok(CompletedJob {
                    execution_id,
                    status,
                });
            }
            JobState::Failed | JobState::Cancelled => {
                error!(
                    step = %step,
                    execution_id = %execution_id,
                    state = %status.state,
                    detail = status.error_detail.as_deref().unwrap_or("-"),
                    "job did not succeed"
                );
                return Err(ReportError::JobFailed {
                    step,
                    state: status.state,
                    detail: status.error_detail,
                });
            }
            JobState::Queued | JobState::Running => {
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.interval).await;
                }
            }
        }
    }

    error!(step = %step, execution_id = %execution_id, "job took too long");
    Err(ReportError::TookTooLong {
        step,
        attempts: policy.max_attempts,
    })
}
