//! Shared fixtures: canned resources, a wired-up set of fakes, and a search
//! wrapper that fails on a chosen page.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tag_inventory_aggregate::{
    AggregationConfig, AggregationContext, AggregationPipeline, MemoryCheckpoints, RetryPolicy,
};
use tag_inventory_core::{PageResult, ResourceRecord, RunDate, Tag, TagGroup};
use tag_inventory_storage::memory::{
    CallLog, MemoryObjectStore, RecordingNotifier, ScriptedSearch, StaticRoleAssumer,
};
use tag_inventory_storage::{ResourceSearch, SearchError, SearchRequest};

use crate::traits::{OrchestratorFactory, OrchestratorParts};

pub const VIEW_ARN: &str =
    "arn:aws:resource-explorer-2:us-east-1:222222222222:view/tag-inventory-all-resources/1";
pub const CENTRAL_BUCKET: &str = "central-tag-inventory";
pub const CENTRAL_ROLE: &str = "arn:aws:iam::111111111111:role/tag-inventory-put";
pub const TOPIC_ARN: &str = "arn:aws:sns:us-east-1:111111111111:tag-inventory";
pub const RUN_ID: &str = "conformance-run";

pub fn run_date() -> RunDate {
    "2024-03-15".parse().unwrap_or_else(|_| RunDate::today())
}

/// Key the run's object lands under.
pub fn object_key() -> String {
    format!("d={}/{}.json", run_date(), RUN_ID)
}

pub fn resource(arn: &str, tags: Vec<Tag>) -> ResourceRecord {
    ResourceRecord {
        arn: arn.to_string(),
        owning_account_id: "222222222222".to_string(),
        region: "us-east-1".to_string(),
        service: "ec2".to_string(),
        resource_type: "ec2:instance".to_string(),
        tags,
        last_reported_at: None,
    }
}

/// Three one-resource pages; the last resource is untagged.
pub fn three_pages() -> Vec<Vec<ResourceRecord>> {
    vec![
        vec![resource("arn:i-1", vec![Tag::new("env", "prod")])],
        vec![resource(
            "arn:i-2",
            vec![Tag::new("env", "dev"), Tag::new("team", "web")],
        )],
        vec![resource("arn:i-3", vec![])],
    ]
}

/// Fakes behind one pipeline, sharing a call log.
pub struct Fixture {
    pub log: CallLog,
    pub search: ScriptedSearch,
    pub store: MemoryObjectStore,
    pub notifier: RecordingNotifier,
    pub checkpoints: MemoryCheckpoints,
    flaky: Option<FailOnToken>,
}

impl Fixture {
    pub fn new(pages: Vec<Vec<ResourceRecord>>) -> Self {
        let log = CallLog::new();
        Fixture {
            search: ScriptedSearch::chain(pages).with_log(log.clone()),
            store: MemoryObjectStore::new().with_log(log.clone()),
            notifier: RecordingNotifier::new().with_log(log.clone()),
            checkpoints: MemoryCheckpoints::new(),
            log,
            flaky: None,
        }
    }

    /// Fail the first `times` searches for `token` with `error`.
    pub fn fail_page(mut self, token: Option<&str>, error: SearchError, times: usize) -> Self {
        self.flaky = Some(FailOnToken::new(
            self.search.clone(),
            token.map(str::to_string),
            error,
            times,
        ));
        self
    }

    pub fn pipeline(&self) -> AggregationPipeline {
        let search: Arc<dyn ResourceSearch> = match &self.flaky {
            Some(flaky) => Arc::new(flaky.clone()),
            None => Arc::new(self.search.clone()),
        };
        let context = AggregationContext {
            search,
            roles: Arc::new(StaticRoleAssumer::new()),
            objects: Arc::new(self.store.clone()),
            notifier: Arc::new(self.notifier.clone()),
        };
        AggregationPipeline::new(
            context,
            AggregationConfig::new(VIEW_ARN, CENTRAL_BUCKET, CENTRAL_ROLE).with_topic(TOPIC_ARN),
        )
    }

    pub fn orchestrator<F: OrchestratorFactory>(&self, factory: &F) -> F::Orchestrator {
        factory.build(OrchestratorParts {
            pipeline: self.pipeline(),
            checkpoints: Arc::new(self.checkpoints.clone()),
            retry: RetryPolicy {
                interval: std::time::Duration::ZERO,
                max_attempts: 3,
                backoff_rate: 1.0,
            },
        })
    }

    /// Objects written to the central bucket.
    pub fn central_keys(&self) -> Vec<String> {
        self.store
            .keys()
            .into_iter()
            .filter(|(bucket, _)| bucket == CENTRAL_BUCKET)
            .map(|(_, key)| key)
            .collect()
    }

    /// The run's written object, parsed.
    pub fn written_groups(&self) -> Result<Vec<TagGroup>, String> {
        let object = self
            .store
            .object(CENTRAL_BUCKET, &object_key())
            .ok_or_else(|| format!("no object at {}/{}", CENTRAL_BUCKET, object_key()))?;
        serde_json::from_slice(&object.body).map_err(|e| format!("object is not JSON: {}", e))
    }
}

/// How often each ARN appears across all groups.
pub fn arn_counts(groups: &[TagGroup]) -> Vec<(String, usize)> {
    let arns: BTreeSet<&str> = groups
        .iter()
        .flat_map(|g| g.resources.iter().map(|r| r.arn.as_str()))
        .collect();
    arns.into_iter()
        .map(|arn| {
            let count = groups
                .iter()
                .map(|g| g.resources.iter().filter(|r| r.arn == arn).count())
                .sum();
            (arn.to_string(), count)
        })
        .collect()
}

/// Search that fails the first N requests for one token, then delegates.
#[derive(Clone)]
pub struct FailOnToken {
    inner: ScriptedSearch,
    token: Option<String>,
    error: SearchError,
    remaining: Arc<Mutex<usize>>,
}

impl FailOnToken {
    pub fn new(
        inner: ScriptedSearch,
        token: Option<String>,
        error: SearchError,
        times: usize,
    ) -> Self {
        FailOnToken {
            inner,
            token,
            error,
            remaining: Arc::new(Mutex::new(times)),
        }
    }
}

#[async_trait]
impl ResourceSearch for FailOnToken {
    async fn search(&self, request: SearchRequest) -> Result<PageResult, SearchError> {
        if request.next_token == self.token {
            let mut remaining = self.remaining.lock().unwrap_or_else(PoisonError::into_inner);
            if *remaining > 0 {
                *remaining -= 1;
                return Err(self.error.clone());
            }
        }
        self.inner.search(request).await
    }
}
