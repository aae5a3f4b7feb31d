//! The individual steps of an aggregation run.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tag_inventory_core::step::{
    run_merge_step, MergeStepInput, MergeStepOutput, SearchStepInput, SearchStepOutput,
};
use tag_inventory_core::{MergeOptions, OutputKey, RunDate, TagGroup};
use tag_inventory_storage::{
    Notifier, ObjectStoreConnector, PutObject, ResourceSearch, RoleAssumer, SearchRequest,
};
use tracing::{debug, info};

use crate::config::AggregationConfig;
use crate::error::AggregationError;

const NOTIFICATION_SUBJECT: &str = "Tag inventory run complete";
const MAX_SESSION_NAME_LEN: usize = 64;

/// The collaborators a run talks to.
#[derive(Clone)]
pub struct AggregationContext {
    pub search: Arc<dyn ResourceSearch>,
    pub roles: Arc<dyn RoleAssumer>,
    pub objects: Arc<dyn ObjectStoreConnector>,
    pub notifier: Arc<dyn Notifier>,
}

/// Summary of the object written by the WriteFinal step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenObject {
    pub bucket: String,
    pub key: String,
    pub bytes: usize,
    /// Hex SHA-256 of the uploaded body.
    pub sha256: String,
    pub tag_groups: usize,
    pub resource_references: usize,
    pub account_id: Option<String>,
}

/// Body of the completion notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompletionMessage {
    pub bucket: String,
    pub key: String,
    pub account: Option<String>,
    pub date: RunDate,
    pub run_id: String,
    pub tag_groups: usize,
    pub resource_references: usize,
    pub sha256: String,
}

/// Aggregation steps bound to their collaborators and settings.
///
/// Every step is independently callable; nothing is remembered between
/// calls; the accumulator travels in the step payloads.
#[derive(Clone)]
pub struct AggregationPipeline {
    context: AggregationContext,
    config: AggregationConfig,
}

impl AggregationPipeline {
    pub fn new(context: AggregationContext, config: AggregationConfig) -> Self {
        AggregationPipeline { context, config }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            dedup_by_arn: self.config.dedup_by_arn,
        }
    }

    /// Fetch one page. Never retries; failures keep their kind.
    pub async fn search(
        &self,
        input: &SearchStepInput,
    ) -> Result<SearchStepOutput, AggregationError> {
        let request = SearchRequest {
            view_arn: self.config.view_arn.clone(),
            query_string: self.config.query_string.clone(),
            max_results: input.max_results.unwrap_or(self.config.max_results),
            next_token: input.next_token.clone(),
        };
        debug!(
            max_results = request.max_results,
            token = request.next_token.as_deref().unwrap_or("-"),
            "searching view"
        );
        let page = self.context.search.search(request).await?;
        info!(
            resources = page.resources.len(),
            total = page.count.total_resources,
            has_more = page.has_more(),
            "search page fetched"
        );
        Ok(SearchStepOutput::from_page(&self.config.view_arn, page))
    }

    /// Fold a grouped page into the carried accumulator.
    pub fn merge(&self, input: MergeStepInput) -> MergeStepOutput {
        let entries = input.results.flatten.len();
        let output = run_merge_step(input, self.merge_options());
        debug!(
            entries,
            groups = output.results.len(),
            has_more = output.has_more(),
            "page merged"
        );
        output
    }

    /// Upload the final groups as a JSON array under `key`, using
    /// credentials of the central write role assumed for this run only.
    pub async fn write_final(
        &self,
        key: &OutputKey,
        groups: &[TagGroup],
    ) -> Result<WrittenObject, AggregationError> {
        let bucket = self.config.central_bucket.clone();
        let object_key = key.object_key();

        let credentials = self
            .context
            .roles
            .assume_role(&self.config.central_role_arn, &session_name(&key.run_id))
            .await?;
        let store = self
            .context
            .objects
            .connect(Some(&credentials))
            .await
            .map_err(|source| AggregationError::Upload {
                bucket: bucket.clone(),
                key: object_key.clone(),
                source,
            })?;

        let body = serde_json::to_vec(groups)?;
        let digest = Sha256::digest(&body);
        let sha256: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        let bytes = body.len();

        store
            .put(PutObject {
                bucket: bucket.clone(),
                key: object_key.clone(),
                body,
                content_type: Some("application/json".to_string()),
                checksum_sha256: Some(BASE64.encode(digest)),
            })
            .await
            .map_err(|source| AggregationError::Upload {
                bucket: bucket.clone(),
                key: object_key.clone(),
                source,
            })?;

        let written = WrittenObject {
            bucket,
            key: object_key,
            bytes,
            sha256,
            tag_groups: groups.len(),
            resource_references: groups.iter().map(|g| g.resources.len()).sum(),
            account_id: self.config.account_id.clone().or_else(|| {
                groups
                    .iter()
                    .flat_map(|g| g.resources.first())
                    .map(|r| r.owning_account_id.clone())
                    .next()
            }),
        };
        info!(
            bucket = %written.bucket,
            key = %written.key,
            bytes = written.bytes,
            tag_groups = written.tag_groups,
            "final object written"
        );
        Ok(written)
    }

    /// Announce a written object. Returns the message id, or `None` when no
    /// topic is configured.
    pub async fn notify(
        &self,
        key: &OutputKey,
        written: &WrittenObject,
    ) -> Result<Option<String>, AggregationError> {
        let Some(topic_arn) = self.config.topic_arn.as_deref() else {
            info!("no topic configured; skipping completion notification");
            return Ok(None);
        };
        let message = CompletionMessage {
            bucket: written.bucket.clone(),
            key: written.key.clone(),
            account: written.account_id.clone(),
            date: key.date,
            run_id: key.run_id.clone(),
            tag_groups: written.tag_groups,
            resource_references: written.resource_references,
            sha256: written.sha256.clone(),
        };
        let body = serde_json::to_string(&message)?;
        let message_id = self
            .context
            .notifier
            .publish(topic_arn, Some(NOTIFICATION_SUBJECT), &body)
            .await?;
        info!(topic = topic_arn, message_id = %message_id, "completion published");
        Ok(Some(message_id))
    }
}

/// Role session name for a run: `tag-inventory-<run id>`, limited to the
/// characters and length the identity service accepts.
pub(crate) fn session_name(run_id: &str) -> String {
    let mut name: String = format!("tag-inventory-{}", run_id)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || "+=,.@-_".contains(*c))
        .collect();
    name.truncate(MAX_SESSION_NAME_LEN);
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use tag_inventory_core::{ResourceRecord, Tag};
    use tag_inventory_storage::memory::{
        MemoryObjectStore, RecordingNotifier, ScriptedSearch, StaticRoleAssumer,
    };
    use tag_inventory_storage::{IdentityError, ObjectStoreError};

    fn resource(arn: &str, tags: Vec<Tag>) -> ResourceRecord {
        ResourceRecord {
            arn: arn.into(),
            owning_account_id: "222222222222".into(),
            region: "eu-west-1".into(),
            service: "ec2".into(),
            resource_type: "ec2:instance".into(),
            tags,
            last_reported_at: None,
        }
    }

    struct Fixture {
        search: ScriptedSearch,
        store: MemoryObjectStore,
        roles: StaticRoleAssumer,
        notifier: RecordingNotifier,
        pipeline: AggregationPipeline,
    }

    fn fixture(config: AggregationConfig) -> Fixture {
        let search = ScriptedSearch::chain(vec![vec![resource(
            "arn:aws:ec2:eu-west-1:222222222222:instance/i-1",
            vec![Tag::new("env", "prod")],
        )]]);
        let store = MemoryObjectStore::new();
        let roles = StaticRoleAssumer::new();
        let notifier = RecordingNotifier::new();
        let context = AggregationContext {
            search: Arc::new(search.clone()),
            roles: Arc::new(roles.clone()),
            objects: Arc::new(store.clone()),
            notifier: Arc::new(notifier.clone()),
        };
        Fixture {
            search,
            store,
            roles,
            notifier,
            pipeline: AggregationPipeline::new(context, config),
        }
    }

    fn config() -> AggregationConfig {
        AggregationConfig::new(
            "arn:aws:resource-explorer-2:eu-west-1:222222222222:view/tag-inventory-all-resources/1",
            "central-bucket",
            "arn:aws:iam::999999999999:role/central-put",
        )
    }

    fn key() -> OutputKey {
        OutputKey::new("2024-01-02".parse().unwrap(), "run-7").unwrap()
    }

    fn groups() -> Vec<TagGroup> {
        vec![TagGroup {
            tag_name: "env".into(),
            tag_value: "prod".into(),
            resources: vec![resource("arn:1", vec![Tag::new("env", "prod")])],
        }]
    }

    #[tokio::test]
    async fn search_uses_configured_view_and_default_page_size() {
        let f = fixture(config());
        let output = f.pipeline.search(&SearchStepInput::default()).await.unwrap();
        assert_eq!(output.resources.len(), 1);
        let calls = f.search.calls();
        assert_eq!(calls[0].max_results, 10);
        assert_eq!(calls[0].query_string, "");
        assert!(calls[0].view_arn.contains("tag-inventory-all-resources"));
    }

    #[tokio::test]
    async fn search_step_input_overrides_page_size() {
        let f = fixture(config());
        let input = SearchStepInput {
            max_results: Some(100),
            next_token: None,
        };
        f.pipeline.search(&input).await.unwrap();
        assert_eq!(f.search.calls()[0].max_results, 100);
    }

    #[tokio::test]
    async fn write_final_uploads_json_with_checksum_under_assumed_role() {
        let f = fixture(config());
        let written = f.pipeline.write_final(&key(), &groups()).await.unwrap();

        assert_eq!(written.key, "d=2024-01-02/run-7.json");
        assert_eq!(written.account_id.as_deref(), Some("222222222222"));
        assert_eq!(
            f.roles.assumed(),
            vec![(
                "arn:aws:iam::999999999999:role/central-put".to_string(),
                "tag-inventory-run-7".to_string()
            )]
        );
        assert_eq!(
            f.store.connections(),
            vec![Some(StaticRoleAssumer::ACCESS_KEY_ID.to_string())]
        );

        let stored = f.store.object("central-bucket", "d=2024-01-02/run-7.json").unwrap();
        let body: serde_json::Value = serde_json::from_slice(&stored.body).unwrap();
        assert_eq!(body[0]["TagName"], "env");
        assert_eq!(body[0]["TagValue"], "prod");
        let expected = BASE64.encode(Sha256::digest(&stored.body));
        assert_eq!(stored.checksum_sha256.as_deref(), Some(expected.as_str()));
        assert_eq!(written.sha256.len(), 64);
    }

    #[tokio::test]
    async fn denied_role_assumption_writes_nothing() {
        let f = fixture(config());
        f.roles.deny(IdentityError::AccessDenied {
            role_arn: "arn:aws:iam::999999999999:role/central-put".into(),
            message: "not authorized".into(),
        });
        let err = f.pipeline.write_final(&key(), &groups()).await.unwrap_err();
        assert!(matches!(err, AggregationError::AssumeRole(_)));
        assert!(f.store.keys().is_empty());
    }

    #[tokio::test]
    async fn failed_put_names_the_target() {
        let f = fixture(config());
        f.store
            .fail_next_put(ObjectStoreError::Throttled("SlowDown".into()));
        let err = f.pipeline.write_final(&key(), &groups()).await.unwrap_err();
        assert!(err.to_string().contains("central-bucket"));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn notify_publishes_completion_message() {
        let f = fixture(config().with_topic("arn:aws:sns:us-east-1:999999999999:tags"));
        let written = f.pipeline.write_final(&key(), &groups()).await.unwrap();
        let id = f.pipeline.notify(&key(), &written).await.unwrap();
        assert_eq!(id.as_deref(), Some("msg-1"));

        let published = f.notifier.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].subject.as_deref(), Some(NOTIFICATION_SUBJECT));
        let message: serde_json::Value = serde_json::from_str(&published[0].message).unwrap();
        assert_eq!(message["Bucket"], "central-bucket");
        assert_eq!(message["Key"], "d=2024-01-02/run-7.json");
        assert_eq!(message["Account"], "222222222222");
        assert_eq!(message["Date"], "2024-01-02");
        assert_eq!(message["TagGroups"], 1);
        assert_eq!(message["ResourceReferences"], 1);
    }

    #[tokio::test]
    async fn notify_without_topic_is_skipped() {
        let f = fixture(config());
        let written = f.pipeline.write_final(&key(), &groups()).await.unwrap();
        assert_eq!(f.pipeline.notify(&key(), &written).await.unwrap(), None);
        assert!(f.notifier.published().is_empty());
    }

    #[test]
    fn session_names_are_sanitized_and_bounded() {
        assert_eq!(session_name("2024 01/02"), "tag-inventory-20240102");
        assert_eq!(session_name(&"x".repeat(100)).len(), 64);
    }
}
