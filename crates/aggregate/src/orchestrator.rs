//! Drivers of the aggregation state machine.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tag_inventory_core::step::{MergeStepInput, PreviousResults, SearchStepInput, SearchStepOutput};
use tag_inventory_core::{OutputKey, RunDate};
use tracing::{debug, info, warn};

use crate::checkpoint::{Checkpoint, CheckpointSink, NoCheckpoints};
use crate::error::AggregationError;
use crate::pipeline::{AggregationPipeline, WrittenObject};
use crate::state::AggregationState;

/// One aggregation run to execute.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub run_id: String,
    pub date: RunDate,
    /// Continue a previous attempt of the same run from its last checkpoint.
    pub resume: Option<Checkpoint>,
}

impl RunRequest {
    pub fn new(run_id: impl Into<String>, date: RunDate) -> Self {
        RunRequest {
            run_id: run_id.into(),
            date,
            resume: None,
        }
    }

    pub fn resuming(mut self, checkpoint: Checkpoint) -> Self {
        self.resume = Some(checkpoint);
        self
    }
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub date: RunDate,
    /// Pages merged, including those merged before a resume.
    pub pages: usize,
    /// Search calls made by this invocation, retries included.
    pub search_calls: usize,
    pub written: WrittenObject,
    pub message_id: Option<String>,
}

/// Anything able to drive a run from first search to notification.
///
/// Implementations must honor the loop and retry contract exercised by the
/// orchestrator conformance suite: only Search is retried, a merged page is
/// never merged again, the final object is written once and announced once.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn run(&self, request: RunRequest) -> Result<RunSummary, AggregationError>;
}

/// Retry policy for transient Search failures, in the shape of a Step
/// Functions `Retry` block.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetryPolicy {
    #[serde(with = "seconds")]
    pub interval: Duration,
    /// Retries after the first attempt.
    pub max_attempts: u32,
    pub backoff_rate: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            interval: Duration::from_secs(2),
            max_attempts: 6,
            backoff_rate: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        RetryPolicy {
            interval: Duration::ZERO,
            max_attempts: 0,
            backoff_rate: 1.0,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_before(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_rate.max(1.0).powi(exponent);
        Duration::try_from_secs_f64(self.interval.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

/// In-process orchestrator.
///
/// Runs the whole state machine in one task. Progress is handed to a
/// [`CheckpointSink`] after every merge so an interrupted run can be resumed
/// with [`RunRequest::resuming`].
pub struct LocalOrchestrator {
    pipeline: AggregationPipeline,
    retry: RetryPolicy,
    checkpoints: Arc<dyn CheckpointSink>,
}

impl LocalOrchestrator {
    pub fn new(pipeline: AggregationPipeline) -> Self {
        LocalOrchestrator {
            pipeline,
            retry: RetryPolicy::default(),
            checkpoints: Arc::new(NoCheckpoints),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_checkpoints(mut self, checkpoints: Arc<dyn CheckpointSink>) -> Self {
        self.checkpoints = checkpoints;
        self
    }

    /// Search with the retry policy applied. Returns the page and the number
    /// of attempts it took.
    async fn search_with_retry(
        &self,
        input: &SearchStepInput,
    ) -> Result<(SearchStepOutput, usize), AggregationError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.pipeline.search(input).await {
                Ok(output) => return Ok((output, attempt as usize)),
                Err(err) if err.is_transient() && attempt <= self.retry.max_attempts => {
                    let delay = self.retry.delay_before(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient search failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl Orchestrator for LocalOrchestrator {
    async fn run(&self, request: RunRequest) -> Result<RunSummary, AggregationError> {
        let key = OutputKey::new(request.date, request.run_id.clone())?;

        let (mut groups, mut token, mut pages, mut state) = match request.resume {
            Some(checkpoint) => {
                if checkpoint.run_id != request.run_id {
                    return Err(AggregationError::ResumeMismatch {
                        expected: request.run_id,
                        found: checkpoint.run_id,
                    });
                }
                let state = if checkpoint.is_exhausted() {
                    AggregationState::WriteFinal
                } else {
                    AggregationState::Search
                };
                info!(
                    run_id = %key.run_id,
                    pages = checkpoint.pages_consumed,
                    state = %state,
                    "resuming from checkpoint"
                );
                (
                    checkpoint.results,
                    checkpoint.next_token,
                    checkpoint.pages_consumed,
                    state,
                )
            }
            None => (Vec::new(), None, 0, AggregationState::Search),
        };

        info!(run_id = %key.run_id, date = %key.date, "aggregation run started");

        let mut page: Option<SearchStepOutput> = None;
        let mut written: Option<WrittenObject> = None;
        let mut message_id = None;
        let mut search_calls = 0;

        while !state.is_terminal() {
            debug!(state = %state, pages, "entering state");
            match state {
                AggregationState::Search => {
                    let input = SearchStepInput {
                        max_results: Some(self.pipeline.config().max_results),
                        next_token: token.clone(),
                    };
                    let (output, attempts) = self.search_with_retry(&input).await?;
                    search_calls += attempts;
                    page = Some(output);
                }
                AggregationState::Merge => {
                    let current = page.take().ok_or_else(|| {
                        AggregationError::Protocol("merge entered without a fetched page".into())
                    })?;
                    let output = self.pipeline.merge(MergeStepInput {
                        results: current.grouped(),
                        previous_results: Some(PreviousResults::Flat(std::mem::take(
                            &mut groups,
                        ))),
                        next_token: current.next_token,
                        payload: None,
                    });
                    groups = output.results;
                    token = output.next_token;
                    pages += 1;
                    self.checkpoints.save(&Checkpoint {
                        run_id: key.run_id.clone(),
                        date: key.date,
                        next_token: token.clone(),
                        results: groups.clone(),
                        pages_consumed: pages,
                    })?;
                }
                AggregationState::WriteFinal => {
                    written = Some(self.pipeline.write_final(&key, &groups).await?);
                }
                AggregationState::Notify => {
                    let object = written.as_ref().ok_or_else(|| {
                        AggregationError::Protocol("notify entered before the final write".into())
                    })?;
                    message_id = self.pipeline.notify(&key, object).await?;
                }
                AggregationState::Done => {}
            }
            state = state.next(token.is_some());
        }

        let written = written.ok_or_else(|| {
            AggregationError::Protocol("run finished without writing its object".into())
        })?;
        info!(
            run_id = %key.run_id,
            pages,
            search_calls,
            key = %written.key,
            "aggregation run finished"
        );
        Ok(RunSummary {
            run_id: key.run_id,
            date: key.date,
            pages,
            search_calls,
            written,
            message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryCheckpoints;
    use crate::config::AggregationConfig;
    use crate::pipeline::AggregationContext;
    use tag_inventory_core::{ResourceRecord, Tag};
    use tag_inventory_storage::memory::{
        CallLog, MemoryObjectStore, RecordingNotifier, ScriptedSearch, StaticRoleAssumer,
    };
    use tag_inventory_storage::SearchError;

    fn resource(arn: &str, tags: Vec<Tag>) -> ResourceRecord {
        ResourceRecord {
            arn: arn.into(),
            owning_account_id: "333333333333".into(),
            region: "us-west-2".into(),
            service: "s3".into(),
            resource_type: "s3:bucket".into(),
            tags,
            last_reported_at: None,
        }
    }

    fn three_pages() -> ScriptedSearch {
        ScriptedSearch::chain(vec![
            vec![resource("arn:a", vec![Tag::new("env", "prod")])],
            vec![resource("arn:b", vec![Tag::new("env", "dev")])],
            vec![resource("arn:c", vec![])],
        ])
    }

    struct Harness {
        store: MemoryObjectStore,
        notifier: RecordingNotifier,
        checkpoints: MemoryCheckpoints,
        orchestrator: LocalOrchestrator,
    }

    fn harness(search: ScriptedSearch, log: CallLog) -> Harness {
        let store = MemoryObjectStore::new().with_log(log.clone());
        let notifier = RecordingNotifier::new().with_log(log);
        let checkpoints = MemoryCheckpoints::new();
        let context = AggregationContext {
            search: Arc::new(search),
            roles: Arc::new(StaticRoleAssumer::new()),
            objects: Arc::new(store.clone()),
            notifier: Arc::new(notifier.clone()),
        };
        let config = AggregationConfig::new("view", "central", "arn:aws:iam::1:role/put")
            .with_topic("arn:aws:sns:us-east-1:1:done");
        let orchestrator = LocalOrchestrator::new(AggregationPipeline::new(context, config))
            .with_retry(RetryPolicy {
                interval: Duration::ZERO,
                max_attempts: 2,
                backoff_rate: 2.0,
            })
            .with_checkpoints(Arc::new(checkpoints.clone()));
        Harness {
            store,
            notifier,
            checkpoints,
            orchestrator,
        }
    }

    fn request() -> RunRequest {
        RunRequest::new("run-1", "2024-01-02".parse().unwrap())
    }

    #[tokio::test]
    async fn three_pages_mean_three_searches() {
        let search = three_pages();
        let h = harness(search.clone(), CallLog::new());
        let summary = h.orchestrator.run(request()).await.unwrap();

        assert_eq!(search.call_count(), 3);
        assert_eq!(summary.pages, 3);
        assert_eq!(summary.search_calls, 3);
        assert_eq!(summary.written.tag_groups, 3);
        assert_eq!(h.checkpoints.saved().len(), 3);
        assert!(h.store.contains("central", "d=2024-01-02/run-1.json"));
        assert_eq!(h.notifier.published().len(), 1);
    }

    #[tokio::test]
    async fn notification_follows_the_write() {
        let log = CallLog::new();
        let h = harness(three_pages(), log.clone());
        h.orchestrator.run(request()).await.unwrap();
        let put = log.position("put central/").unwrap();
        let publish = log.position("publish").unwrap();
        assert!(put < publish, "log: {:?}", log.entries());
    }

    #[tokio::test]
    async fn transient_failures_are_retried_within_budget() {
        let search = three_pages();
        search.fail_next(SearchError::Throttled("rate".into()));
        search.fail_next(SearchError::Timeout("read".into()));
        let h = harness(search.clone(), CallLog::new());
        let summary = h.orchestrator.run(request()).await.unwrap();
        assert_eq!(summary.search_calls, 5);
        assert_eq!(summary.pages, 3);
        assert_eq!(summary.written.resource_references, 3);
    }

    #[tokio::test]
    async fn retry_budget_exhaustion_is_fatal() {
        let search = three_pages();
        for _ in 0..3 {
            search.fail_next(SearchError::Throttled("rate".into()));
        }
        let h = harness(search.clone(), CallLog::new());
        let err = h.orchestrator.run(request()).await.unwrap_err();
        assert!(matches!(err, AggregationError::Search(SearchError::Throttled(_))));
        assert_eq!(search.call_count(), 3);
        assert!(h.store.keys().is_empty());
    }

    #[tokio::test]
    async fn non_transient_search_failure_is_not_retried() {
        let search = three_pages();
        search.fail_next(SearchError::AccessDenied("no".into()));
        let h = harness(search.clone(), CallLog::new());
        let err = h.orchestrator.run(request()).await.unwrap_err();
        assert!(err.kind().needs_operator());
        assert_eq!(search.call_count(), 1);
        assert!(h.notifier.published().is_empty());
    }

    #[tokio::test]
    async fn resume_continues_from_checkpoint_token() {
        let search = three_pages();
        let checkpoint = Checkpoint {
            run_id: "run-1".into(),
            date: "2024-01-02".parse().unwrap(),
            next_token: Some("page-3".into()),
            results: vec![tag_inventory_core::TagGroup {
                tag_name: "env".into(),
                tag_value: "prod".into(),
                resources: vec![resource("arn:a", vec![Tag::new("env", "prod")])],
            }],
            pages_consumed: 2,
        };
        let h = harness(search.clone(), CallLog::new());
        let summary = h
            .orchestrator
            .run(request().resuming(checkpoint))
            .await
            .unwrap();
        assert_eq!(search.call_count(), 1);
        assert_eq!(search.calls()[0].next_token.as_deref(), Some("page-3"));
        assert_eq!(summary.pages, 3);
        assert_eq!(summary.written.tag_groups, 2);
    }

    #[tokio::test]
    async fn exhausted_checkpoint_goes_straight_to_write() {
        let search = three_pages();
        let checkpoint = Checkpoint {
            run_id: "run-1".into(),
            date: "2024-01-02".parse().unwrap(),
            next_token: None,
            results: Vec::new(),
            pages_consumed: 3,
        };
        let h = harness(search.clone(), CallLog::new());
        h.orchestrator
            .run(request().resuming(checkpoint))
            .await
            .unwrap();
        assert_eq!(search.call_count(), 0);
        assert!(h.store.contains("central", "d=2024-01-02/run-1.json"));
    }

    #[tokio::test]
    async fn checkpoint_from_another_run_is_rejected() {
        let checkpoint = Checkpoint {
            run_id: "other".into(),
            date: "2024-01-02".parse().unwrap(),
            next_token: None,
            results: Vec::new(),
            pages_consumed: 1,
        };
        let h = harness(three_pages(), CallLog::new());
        let err = h
            .orchestrator
            .run(request().resuming(checkpoint))
            .await
            .unwrap_err();
        assert!(matches!(err, AggregationError::ResumeMismatch { .. }));
    }

    #[test]
    fn backoff_grows_geometrically() {
        let policy = RetryPolicy {
            interval: Duration::from_secs(2),
            max_attempts: 6,
            backoff_rate: 2.0,
        };
        assert_eq!(policy.delay_before(1), Duration::from_secs(2));
        assert_eq!(policy.delay_before(2), Duration::from_secs(4));
        assert_eq!(policy.delay_before(4), Duration::from_secs(16));
    }

    #[test]
    fn retry_policy_reads_step_functions_shape() {
        let policy: RetryPolicy = serde_json::from_str(
            r#"{"Interval": 1, "MaxAttempts": 3, "BackoffRate": 1.5}"#,
        )
        .unwrap();
        assert_eq!(policy.interval, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 3);
    }
}
