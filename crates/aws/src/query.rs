use async_trait::async_trait;
use aws_sdk_athena::types::QueryExecutionState;
use aws_sdk_athena::Client;
use tag_inventory_storage::{JobState, JobStatus, QueryEngine, QueryError, ResultRows};
use tracing::debug;

use crate::classify::classify;

/// Athena statements. The work group supplies the output location.
#[derive(Clone)]
pub struct AthenaQueryEngine {
    client: Client,
}

impl AthenaQueryEngine {
    pub fn new(client: Client) -> Self {
        AthenaQueryEngine { client }
    }
}

fn job_state(state: &QueryExecutionState) -> Result<JobState, QueryError> {
    match state {
        QueryExecutionState::Queued => Ok(JobState::Queued),
        QueryExecutionState::Running => Ok(JobState::Running),
        QueryExecutionState::Succeeded => Ok(JobState::Succeeded),
        QueryExecutionState::Failed => Ok(JobState::Failed),
        QueryExecutionState::Cancelled => Ok(JobState::Cancelled),
        other => Err(QueryError::Other(format!(
            "unrecognised query state '{}'",
            other.as_str()
        ))),
    }
}

#[async_trait]
impl QueryEngine for AthenaQueryEngine {
    async fn submit(&self, query: &str, work_group: &str) -> Result<String, QueryError> {
        let output = self
            .client
            .start_query_execution()
            .query_string(query)
            .work_group(work_group)
            .send()
            .await
            .map_err(|err| classify(&err).into_query_error())?;
        output
            .query_execution_id()
            .map(str::to_string)
            .ok_or_else(|| QueryError::Other("no execution id returned".to_string()))
    }

    async fn get_status(&self, execution_id: &str) -> Result<JobStatus, QueryError> {
        let output = self
            .client
            .get_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await
            .map_err(|err| classify(&err).into_query_error())?;
        let execution = output
            .query_execution()
            .ok_or_else(|| QueryError::NotFound(execution_id.to_string()))?;
        let status = execution.status();
        let state = status
            .and_then(|s| s.state())
            .ok_or_else(|| QueryError::Other(format!("{} has no state", execution_id)))?;

        let error_detail = status.and_then(|s| {
            s.athena_error()
                .and_then(|e| e.error_message())
                .or_else(|| s.state_change_reason())
                .map(str::to_string)
        });
        Ok(JobStatus {
            state: job_state(state)?,
            manifest_location: execution
                .statistics()
                .and_then(|s| s.data_manifest_location())
                .map(str::to_string),
            error_detail,
        })
    }

    async fn get_results(&self, execution_id: &str) -> Result<ResultRows, QueryError> {
        let mut rows = ResultRows::new();
        let mut next_token = None;
        let mut header = true;
        loop {
            let output = self
                .client
                .get_query_results()
                .query_execution_id(execution_id)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|err| classify(&err).into_query_error())?;
            if let Some(result_set) = output.result_set() {
                // The column header is the first row of the first page only.
                let skip = usize::from(header);
                rows.extend(result_set.rows().iter().skip(skip).map(|row| {
                    row.data()
                        .iter()
                        .map(|datum| datum.var_char_value().map(str::to_string))
                        .collect::<Vec<_>>()
                }));
            }
            header = false;
            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }
        debug!(execution_id, rows = rows.len(), "query results read");
        Ok(rows)
    }
}
