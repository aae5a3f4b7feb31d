use std::sync::Arc;

use async_trait::async_trait;
use tag_inventory_core::PageResult;

use crate::error::{
    IdentityError, IndexError, NotifyError, ObjectStoreError, QueryError, SearchError,
};
use crate::record::{
    IndexType, JobStatus, PutObject, ResultRows, SearchRequest, TemporaryCredentials, ViewPage,
};

/// Paginated search over a resource-index view.
///
/// One call returns one page. Implementations never retry internally:
/// throttling and timeouts surface as [`SearchError::Throttled`] /
/// [`SearchError::Timeout`] so the orchestrator's retry policy decides.
#[async_trait]
pub trait ResourceSearch: Send + Sync {
    async fn search(&self, request: SearchRequest) -> Result<PageResult, SearchError>;
}

/// Durable object storage.
///
/// `delete` of a missing key succeeds; `get` of a missing key is
/// [`ObjectStoreError::NotFound`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, object: PutObject) -> Result<(), ObjectStoreError>;

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<(), ObjectStoreError>;

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError>;

    /// Every key under `prefix`, in lexicographic order.
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, ObjectStoreError>;
}

/// Builds an [`ObjectStore`] bound to a set of credentials.
///
/// `None` means the caller's own ambient identity. Cross-account writes pass
/// the credentials of an assumed role; the returned store lives no longer
/// than the run that assumed it.
#[async_trait]
pub trait ObjectStoreConnector: Send + Sync {
    async fn connect(
        &self,
        credentials: Option<&TemporaryCredentials>,
    ) -> Result<Arc<dyn ObjectStore>, ObjectStoreError>;
}

/// SQL-like query engine with asynchronous job execution.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Submit a statement; returns the execution id.
    async fn submit(&self, query: &str, work_group: &str) -> Result<String, QueryError>;

    /// Poll a job's state once.
    async fn get_status(&self, execution_id: &str) -> Result<JobStatus, QueryError>;

    /// Data rows of a succeeded job, header row removed.
    async fn get_results(&self, execution_id: &str) -> Result<ResultRows, QueryError>;
}

/// Cross-account identity.
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<TemporaryCredentials, IdentityError>;
}

/// Pub/sub notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish `message`; returns the provider's message id.
    async fn publish(
        &self,
        topic_arn: &str,
        subject: Option<&str>,
        message: &str,
    ) -> Result<String, NotifyError>;
}

/// Administration of regional resource indexes and views.
///
/// "Already exists" and "already in that state" answers surface as
/// [`IndexError::Conflict`]; callers decide whether that means success.
#[async_trait]
pub trait IndexAdmin: Send + Sync {
    /// Turn on the index in `region`; returns its ARN.
    async fn create_index(&self, region: &str) -> Result<String, IndexError>;

    /// ARN of the existing index in `region`.
    async fn get_index(&self, region: &str) -> Result<String, IndexError>;

    async fn update_index_type(
        &self,
        region: &str,
        index_arn: &str,
        index_type: IndexType,
    ) -> Result<(), IndexError>;

    /// Create a view named `name`; returns its ARN.
    async fn create_view(
        &self,
        region: &str,
        name: &str,
        included_properties: &[String],
    ) -> Result<String, IndexError>;

    async fn list_views(
        &self,
        region: &str,
        next_token: Option<String>,
    ) -> Result<ViewPage, IndexError>;

    /// Canonical ARN of a view.
    async fn get_view(&self, region: &str, view_arn: &str) -> Result<String, IndexError>;

    /// The account's default view, if one is set. Some backends answer
    /// [`IndexError::NotFound`] instead of `Ok(None)`.
    async fn get_default_view(&self, region: &str) -> Result<Option<String>, IndexError>;

    async fn associate_default_view(
        &self,
        region: &str,
        view_arn: &str,
    ) -> Result<String, IndexError>;
}
