//! In-process backends for every collaborator trait.
//!
//! They keep their state behind `Arc<Mutex<..>>`, so a clone handed to a
//! pipeline and the clone kept by a test observe the same calls. Each one can
//! be scripted with canned answers and injected failures.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tag_inventory_core::{PageResult, ResourceRecord, SearchCount};

use crate::error::{
    IdentityError, IndexError, NotifyError, ObjectStoreError, QueryError, SearchError,
};
use crate::record::{
    IndexType, JobState, JobStatus, PutObject, ResultRows, SearchRequest, TemporaryCredentials,
    ViewPage,
};
use crate::traits::{
    IndexAdmin, Notifier, ObjectStore, ObjectStoreConnector, QueryEngine, ResourceSearch,
    RoleAssumer,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ──────────────────────────────────────────────
// Call log
// ──────────────────────────────────────────────

/// Ordered record of calls across several fakes.
///
/// Hand the same log to more than one fake to assert on the relative order
/// of their calls (for example that a notification follows the upload).
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        lock(&self.entries).push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }

    /// Position of the first entry starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        lock(&self.entries)
            .iter()
            .position(|e| e.starts_with(prefix))
    }
}

// ──────────────────────────────────────────────
// Resource search
// ──────────────────────────────────────────────

#[derive(Debug, Default)]
struct SearchInner {
    pages: HashMap<Option<String>, PageResult>,
    failures: VecDeque<SearchError>,
    calls: Vec<SearchRequest>,
}

/// Search backend that serves pre-built pages keyed by request token.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSearch {
    inner: Arc<Mutex<SearchInner>>,
    log: Option<CallLog>,
}

impl ScriptedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages linked in order: the first answers a request without a token,
    /// each later one answers the token `page-<n>` the previous page returned.
    pub fn chain(pages: Vec<Vec<ResourceRecord>>) -> Self {
        let search = ScriptedSearch::new();
        let total: usize = pages.iter().map(Vec::len).sum();
        let count = pages.len();
        for (i, resources) in pages.into_iter().enumerate() {
            let token = if i == 0 {
                None
            } else {
                Some(format!("page-{}", i + 1))
            };
            let next_token = if i + 1 < count {
                Some(format!("page-{}", i + 2))
            } else {
                None
            };
            search.add_page(
                token,
                PageResult {
                    resources,
                    next_token,
                    count: SearchCount {
                        complete: true,
                        total_resources: total as i64,
                    },
                },
            );
        }
        search
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn add_page(&self, token: Option<String>, page: PageResult) {
        lock(&self.inner).pages.insert(token, page);
    }

    /// Queue a failure; queued failures are returned, oldest first, before
    /// any page is served.
    pub fn fail_next(&self, error: SearchError) {
        lock(&self.inner).failures.push_back(error);
    }

    pub fn calls(&self) -> Vec<SearchRequest> {
        lock(&self.inner).calls.clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.inner).calls.len()
    }
}

#[async_trait]
impl ResourceSearch for ScriptedSearch {
    async fn search(&self, request: SearchRequest) -> Result<PageResult, SearchError> {
        if let Some(log) = &self.log {
            log.record(format!(
                "search {}",
                request.next_token.as_deref().unwrap_or("-")
            ));
        }
        let mut inner = lock(&self.inner);
        inner.calls.push(request.clone());
        if let Some(err) = inner.failures.pop_front() {
            return Err(err);
        }
        inner
            .pages
            .get(&request.next_token)
            .cloned()
            .ok_or_else(|| {
                SearchError::Validation(format!(
                    "unknown pagination token {:?}",
                    request.next_token
                ))
            })
    }
}

// ──────────────────────────────────────────────
// Object storage
// ──────────────────────────────────────────────

/// An object held by [`MemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub checksum_sha256: Option<String>,
}

#[derive(Debug, Default)]
struct ObjectStoreInner {
    objects: BTreeMap<(String, String), StoredObject>,
    put_failures: VecDeque<ObjectStoreError>,
    connections: Vec<Option<String>>,
}

/// Object store backed by a sorted map.
///
/// Also acts as its own [`ObjectStoreConnector`]: every connection shares
/// the same objects, and the access key id used for each is recorded.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<Mutex<ObjectStoreInner>>,
    log: Option<CallLog>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Seed an object without going through `put`.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        lock(&self.inner).objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: body.into(),
                content_type: None,
                checksum_sha256: None,
            },
        );
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        lock(&self.inner)
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.object(bucket, key).is_some()
    }

    /// Every `(bucket, key)` currently stored, in order.
    pub fn keys(&self) -> Vec<(String, String)> {
        lock(&self.inner).objects.keys().cloned().collect()
    }

    pub fn fail_next_put(&self, error: ObjectStoreError) {
        lock(&self.inner).put_failures.push_back(error);
    }

    /// Access key id of each connection made, `None` for ambient identity.
    pub fn connections(&self) -> Vec<Option<String>> {
        lock(&self.inner).connections.clone()
    }

    fn note(&self, entry: String) {
        if let Some(log) = &self.log {
            log.record(entry);
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, object: PutObject) -> Result<(), ObjectStoreError> {
        self.note(format!("put {}/{}", object.bucket, object.key));
        let mut inner = lock(&self.inner);
        if let Some(err) = inner.put_failures.pop_front() {
            return Err(err);
        }
        inner.objects.insert(
            (object.bucket, object.key),
            StoredObject {
                body: object.body,
                content_type: object.content_type,
                checksum_sha256: object.checksum_sha256,
            },
        );
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.object(bucket, key)
            .map(|o| o.body)
            .ok_or_else(|| ObjectStoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<(), ObjectStoreError> {
        self.note(format!(
            "copy {}/{} -> {}/{}",
            src_bucket, src_key, dst_bucket, dst_key
        ));
        let mut inner = lock(&self.inner);
        let source = inner
            .objects
            .get(&(src_bucket.to_string(), src_key.to_string()))
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound {
                bucket: src_bucket.to_string(),
                key: src_key.to_string(),
            })?;
        inner
            .objects
            .insert((dst_bucket.to_string(), dst_key.to_string()), source);
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        self.note(format!("delete {}/{}", bucket, key));
        lock(&self.inner)
            .objects
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        Ok(lock(&self.inner)
            .objects
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .collect())
    }
}

#[async_trait]
impl ObjectStoreConnector for MemoryObjectStore {
    async fn connect(
        &self,
        credentials: Option<&TemporaryCredentials>,
    ) -> Result<Arc<dyn ObjectStore>, ObjectStoreError> {
        lock(&self.inner)
            .connections
            .push(credentials.map(|c| c.access_key_id.clone()));
        Ok(Arc::new(self.clone()))
    }
}

// ──────────────────────────────────────────────
// Query engine
// ──────────────────────────────────────────────

/// Canned behavior for every statement containing `pattern`.
#[derive(Debug, Clone)]
pub struct QueryScript {
    pattern: String,
    states: Vec<JobState>,
    manifest_location: Option<String>,
    error_detail: Option<String>,
    rows: ResultRows,
    submit_error: Option<QueryError>,
    skip: usize,
}

impl QueryScript {
    /// By default a matching job succeeds on its first poll with no rows.
    pub fn matching(pattern: impl Into<String>) -> Self {
        QueryScript {
            pattern: pattern.into(),
            states: vec![JobState::Succeeded],
            manifest_location: None,
            error_detail: None,
            rows: Vec::new(),
            submit_error: None,
            skip: 0,
        }
    }

    /// States returned by successive polls; the last repeats forever.
    pub fn states(mut self, states: Vec<JobState>) -> Self {
        self.states = states;
        self
    }

    pub fn failed(mut self, detail: impl Into<String>) -> Self {
        self.states = vec![JobState::Running, JobState::Failed];
        self.error_detail = Some(detail.into());
        self
    }

    pub fn manifest(mut self, location: impl Into<String>) -> Self {
        self.manifest_location = Some(location.into());
        self
    }

    pub fn rows(mut self, rows: ResultRows) -> Self {
        self.rows = rows;
        self
    }

    pub fn reject_submit(mut self, error: QueryError) -> Self {
        self.submit_error = Some(error);
        self
    }

    /// Apply only from the `n`-th matching statement on (1-based); earlier
    /// matches fall through to later scripts or the default.
    pub fn from_occurrence(mut self, n: usize) -> Self {
        self.skip = n.saturating_sub(1);
        self
    }
}

#[derive(Debug)]
struct Execution {
    script: QueryScript,
    polls: usize,
}

#[derive(Debug, Default)]
struct QueryInner {
    scripts: Vec<(QueryScript, usize)>,
    executions: HashMap<String, Execution>,
    submitted: Vec<(String, String)>,
}

/// Query engine answering from [`QueryScript`]s.
///
/// The most recently added matching script wins, so a test can layer an
/// override on a baseline. Statements no script matches succeed immediately
/// with no rows.
#[derive(Debug, Clone, Default)]
pub struct ScriptedQueryEngine {
    inner: Arc<Mutex<QueryInner>>,
}

impl ScriptedQueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, script: QueryScript) {
        lock(&self.inner).scripts.push((script, 0));
    }

    /// Statements submitted so far, in order.
    pub fn submitted(&self) -> Vec<String> {
        lock(&self.inner)
            .submitted
            .iter()
            .map(|(q, _)| q.clone())
            .collect()
    }

    pub fn work_groups(&self) -> Vec<String> {
        lock(&self.inner)
            .submitted
            .iter()
            .map(|(_, w)| w.clone())
            .collect()
    }

    /// Number of status polls made against the execution of the first
    /// submitted statement containing `pattern`.
    pub fn polls_for(&self, pattern: &str) -> Option<usize> {
        let inner = lock(&self.inner);
        let index = inner
            .submitted
            .iter()
            .position(|(q, _)| q.contains(pattern))?;
        inner
            .executions
            .get(&format!("exec-{}", index + 1))
            .map(|e| e.polls)
    }
}

#[async_trait]
impl QueryEngine for ScriptedQueryEngine {
    async fn submit(&self, query: &str, work_group: &str) -> Result<String, QueryError> {
        let mut inner = lock(&self.inner);
        inner
            .submitted
            .push((query.to_string(), work_group.to_string()));
        let id = format!("exec-{}", inner.submitted.len());
        let mut chosen = None;
        for (script, seen) in inner.scripts.iter_mut().rev() {
            if !query.contains(&script.pattern) {
                continue;
            }
            *seen += 1;
            if chosen.is_none() && *seen > script.skip {
                chosen = Some(script.clone());
            }
        }
        let script = chosen.unwrap_or_else(|| QueryScript::matching(""));
        if let Some(err) = script.submit_error.clone() {
            return Err(err);
        }
        inner
            .executions
            .insert(id.clone(), Execution { script, polls: 0 });
        Ok(id)
    }

    async fn get_status(&self, execution_id: &str) -> Result<JobStatus, QueryError> {
        let mut inner = lock(&self.inner);
        let execution = inner
            .executions
            .get_mut(execution_id)
            .ok_or_else(|| QueryError::NotFound(execution_id.to_string()))?;
        let index = execution.polls.min(execution.script.states.len().saturating_sub(1));
        execution.polls += 1;
        let state = execution
            .script
            .states
            .get(index)
            .copied()
            .unwrap_or(JobState::Succeeded);
        Ok(JobStatus {
            state,
            manifest_location: execution.script.manifest_location.clone(),
            error_detail: match state {
                JobState::Failed | JobState::Cancelled => execution.script.error_detail.clone(),
                _ => None,
            },
        })
    }

    async fn get_results(&self, execution_id: &str) -> Result<ResultRows, QueryError> {
        lock(&self.inner)
            .executions
            .get(execution_id)
            .map(|e| e.script.rows.clone())
            .ok_or_else(|| QueryError::NotFound(execution_id.to_string()))
    }
}

// ──────────────────────────────────────────────
// Identity
// ──────────────────────────────────────────────

#[derive(Debug, Default)]
struct RoleInner {
    assumed: Vec<(String, String)>,
    failure: Option<IdentityError>,
}

/// Role assumer that hands out fixed credentials.
#[derive(Debug, Clone, Default)]
pub struct StaticRoleAssumer {
    inner: Arc<Mutex<RoleInner>>,
}

impl StaticRoleAssumer {
    /// Access key id of the credentials handed out.
    pub const ACCESS_KEY_ID: &'static str = "ASIAMEMORYEXAMPLE";

    pub fn new() -> Self {
        Self::default()
    }

    /// Every later assumption fails with `error`.
    pub fn deny(&self, error: IdentityError) {
        lock(&self.inner).failure = Some(error);
    }

    /// `(role_arn, session_name)` of each assumption, successful or not.
    pub fn assumed(&self) -> Vec<(String, String)> {
        lock(&self.inner).assumed.clone()
    }
}

#[async_trait]
impl RoleAssumer for StaticRoleAssumer {
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<TemporaryCredentials, IdentityError> {
        let mut inner = lock(&self.inner);
        inner
            .assumed
            .push((role_arn.to_string(), session_name.to_string()));
        if let Some(err) = inner.failure.clone() {
            return Err(err);
        }
        Ok(TemporaryCredentials {
            access_key_id: Self::ACCESS_KEY_ID.to_string(),
            secret_access_key: "memory-secret".to_string(),
            session_token: format!("session-{}", session_name),
            expiration: None,
        })
    }
}

// ──────────────────────────────────────────────
// Notifications
// ──────────────────────────────────────────────

/// A message captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic_arn: String,
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, Default)]
struct NotifyInner {
    published: Vec<Published>,
    failure: Option<NotifyError>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    inner: Arc<Mutex<NotifyInner>>,
    log: Option<CallLog>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn fail_with(&self, error: NotifyError) {
        lock(&self.inner).failure = Some(error);
    }

    pub fn published(&self) -> Vec<Published> {
        lock(&self.inner).published.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(
        &self,
        topic_arn: &str,
        subject: Option<&str>,
        message: &str,
    ) -> Result<String, NotifyError> {
        if let Some(log) = &self.log {
            log.record(format!("publish {}", topic_arn));
        }
        let mut inner = lock(&self.inner);
        if let Some(err) = inner.failure.clone() {
            return Err(err);
        }
        inner.published.push(Published {
            topic_arn: topic_arn.to_string(),
            subject: subject.map(str::to_string),
            message: message.to_string(),
        });
        Ok(format!("msg-{}", inner.published.len()))
    }
}

// ──────────────────────────────────────────────
// Index administration
// ──────────────────────────────────────────────

#[derive(Debug, Default)]
struct RegionState {
    index: Option<(String, IndexType)>,
    views: Vec<String>,
    default_view: Option<String>,
}

#[derive(Debug, Default)]
struct IndexInner {
    regions: BTreeMap<String, RegionState>,
    calls: Vec<String>,
    missing_default_is_error: bool,
    failures: BTreeMap<String, IndexError>,
    view_serial: usize,
}

/// Index administration emulating the resource index service.
///
/// Creating an index or view that already exists, or promoting an index that
/// is already an aggregator, answers [`IndexError::Conflict`]. View listings
/// come back one ARN per page so callers must follow pagination.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndexAdmin {
    inner: Arc<Mutex<IndexInner>>,
}

impl MemoryIndexAdmin {
    pub const ACCOUNT_ID: &'static str = "123456789012";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_arn(region: &str) -> String {
        format!(
            "arn:aws:resource-explorer-2:{}:{}:index/memory-{}",
            region,
            Self::ACCOUNT_ID,
            region
        )
    }

    /// Seed a view named `name` in `region`; returns its ARN.
    pub fn seed_view(&self, region: &str, name: &str) -> String {
        let mut inner = lock(&self.inner);
        let arn = next_view_arn(&mut inner, region, name);
        inner
            .regions
            .entry(region.to_string())
            .or_default()
            .views
            .push(arn.clone());
        arn
    }

    /// Seed an index in `region`.
    pub fn seed_index(&self, region: &str, index_type: IndexType) {
        lock(&self.inner)
            .regions
            .entry(region.to_string())
            .or_default()
            .index = Some((Self::index_arn(region), index_type));
    }

    /// Answer "no default view" with `NotFound` instead of `Ok(None)`.
    pub fn missing_default_view_is_error(&self) {
        lock(&self.inner).missing_default_is_error = true;
    }

    /// Make every call to `operation` (e.g. `"create_index"`) answer `error`.
    pub fn fail(&self, operation: &str, error: IndexError) {
        lock(&self.inner)
            .failures
            .insert(operation.to_string(), error);
    }

    pub fn index_type(&self, region: &str) -> Option<IndexType> {
        lock(&self.inner)
            .regions
            .get(region)
            .and_then(|r| r.index.as_ref().map(|(_, t)| *t))
    }

    pub fn views(&self, region: &str) -> Vec<String> {
        lock(&self.inner)
            .regions
            .get(region)
            .map(|r| r.views.clone())
            .unwrap_or_default()
    }

    pub fn default_view(&self, region: &str) -> Option<String> {
        lock(&self.inner)
            .regions
            .get(region)
            .and_then(|r| r.default_view.clone())
    }

    /// Calls made, as `"<operation> <region>"`.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.inner).calls.clone()
    }
}

impl IndexInner {
    fn record(&mut self, operation: &str, region: &str) -> Result<(), IndexError> {
        self.calls.push(format!("{} {}", operation, region));
        match self.failures.get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn next_view_arn(inner: &mut IndexInner, region: &str, name: &str) -> String {
    inner.view_serial += 1;
    format!(
        "arn:aws:resource-explorer-2:{}:{}:view/{}/{:08x}",
        region,
        MemoryIndexAdmin::ACCOUNT_ID,
        name,
        inner.view_serial
    )
}

fn view_name(arn: &str) -> Option<&str> {
    arn.split('/').nth(1)
}

#[async_trait]
impl IndexAdmin for MemoryIndexAdmin {
    async fn create_index(&self, region: &str) -> Result<String, IndexError> {
        let mut inner = lock(&self.inner);
        inner.record("create_index", region)?;
        let state = inner.regions.entry(region.to_string()).or_default();
        if state.index.is_some() {
            return Err(IndexError::Conflict(format!(
                "an index already exists in {}",
                region
            )));
        }
        let arn = Self::index_arn(region);
        state.index = Some((arn.clone(), IndexType::Local));
        Ok(arn)
    }

    async fn get_index(&self, region: &str) -> Result<String, IndexError> {
        let mut inner = lock(&self.inner);
        inner.record("get_index", region)?;
        inner
            .regions
            .get(region)
            .and_then(|r| r.index.as_ref().map(|(arn, _)| arn.clone()))
            .ok_or_else(|| IndexError::NotFound(format!("no index in {}", region)))
    }

    async fn update_index_type(
        &self,
        region: &str,
        index_arn: &str,
        index_type: IndexType,
    ) -> Result<(), IndexError> {
        let mut inner = lock(&self.inner);
        inner.record("update_index_type", region)?;
        let index = inner
            .regions
            .get_mut(region)
            .and_then(|r| r.index.as_mut())
            .filter(|(arn, _)| arn == index_arn)
            .ok_or_else(|| IndexError::NotFound(index_arn.to_string()))?;
        if index.1 == index_type {
            return Err(IndexError::Conflict(format!(
                "index is already {:?}",
                index_type
            )));
        }
        index.1 = index_type;
        Ok(())
    }

    async fn create_view(
        &self,
        region: &str,
        name: &str,
        _included_properties: &[String],
    ) -> Result<String, IndexError> {
        let mut inner = lock(&self.inner);
        inner.record("create_view", region)?;
        let exists = inner
            .regions
            .get(region)
            .map(|r| r.views.iter().any(|v| view_name(v) == Some(name)))
            .unwrap_or(false);
        if exists {
            return Err(IndexError::Conflict(format!(
                "a view named '{}' already exists",
                name
            )));
        }
        let arn = next_view_arn(&mut inner, region, name);
        inner
            .regions
            .entry(region.to_string())
            .or_default()
            .views
            .push(arn.clone());
        Ok(arn)
    }

    async fn list_views(
        &self,
        region: &str,
        next_token: Option<String>,
    ) -> Result<ViewPage, IndexError> {
        let mut inner = lock(&self.inner);
        inner.record("list_views", region)?;
        let start = match next_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| IndexError::Other(format!("bad pagination token '{}'", token)))?,
            None => 0,
        };
        let views = inner
            .regions
            .get(region)
            .map(|r| r.views.clone())
            .unwrap_or_default();
        Ok(ViewPage {
            view_arns: views.get(start).cloned().into_iter().collect(),
            next_token: (start + 1 < views.len()).then(|| (start + 1).to_string()),
        })
    }

    async fn get_view(&self, region: &str, view_arn: &str) -> Result<String, IndexError> {
        let mut inner = lock(&self.inner);
        inner.record("get_view", region)?;
        inner
            .regions
            .get(region)
            .and_then(|r| r.views.iter().find(|v| v.as_str() == view_arn).cloned())
            .ok_or_else(|| IndexError::NotFound(view_arn.to_string()))
    }

    async fn get_default_view(&self, region: &str) -> Result<Option<String>, IndexError> {
        let mut inner = lock(&self.inner);
        inner.record("get_default_view", region)?;
        let current = inner
            .regions
            .get(region)
            .and_then(|r| r.default_view.clone());
        match current {
            None if inner.missing_default_is_error => Err(IndexError::NotFound(format!(
                "no default view in {}",
                region
            ))),
            other => Ok(other),
        }
    }

    async fn associate_default_view(
        &self,
        region: &str,
        view_arn: &str,
    ) -> Result<String, IndexError> {
        let mut inner = lock(&self.inner);
        inner.record("associate_default_view", region)?;
        inner.regions.entry(region.to_string()).or_default().default_view =
            Some(view_arn.to_string());
        Ok(view_arn.to_string())
    }
}
