use std::sync::Arc;

use serde_json::json;
use tag_inventory_bootstrap::{
    handle_request, BootstrapConfig, BootstrapError, CustomResourceRequest, DefaultView,
    IndexBootstrap, ResponseStatus,
};
use tag_inventory_storage::memory::MemoryIndexAdmin;
use tag_inventory_storage::{IndexError, IndexType};

fn config() -> BootstrapConfig {
    BootstrapConfig::new(
        vec!["us-east-1".to_string(), "eu-west-1".to_string()],
        "us-east-1",
    )
}

fn bootstrap(admin: &MemoryIndexAdmin) -> IndexBootstrap {
    IndexBootstrap::new(Arc::new(admin.clone()), config())
}

#[tokio::test]
async fn fresh_account_gets_indexes_aggregator_and_default_view() {
    let admin = MemoryIndexAdmin::new();

    let outcome = bootstrap(&admin).run().await.unwrap();

    assert_eq!(
        outcome.indexes,
        vec![
            ("us-east-1".to_string(), MemoryIndexAdmin::index_arn("us-east-1")),
            ("eu-west-1".to_string(), MemoryIndexAdmin::index_arn("eu-west-1")),
        ]
    );
    assert_eq!(admin.index_type("us-east-1"), Some(IndexType::Aggregator));
    assert_eq!(admin.index_type("eu-west-1"), Some(IndexType::Local));
    assert_eq!(outcome.view_arn.split('/').nth(1), Some("tag-inventory-all-resources"));
    assert_eq!(outcome.default_view, DefaultView::Associated(outcome.view_arn.clone()));
    assert_eq!(admin.default_view("us-east-1"), Some(outcome.view_arn.clone()));
}

#[tokio::test]
async fn running_twice_is_a_no_op_with_the_same_view() {
    let admin = MemoryIndexAdmin::new();
    let first = bootstrap(&admin).run().await.unwrap();
    let second = bootstrap(&admin).run().await.unwrap();

    assert_eq!(first.indexes, second.indexes);
    assert_eq!(first.view_arn, second.view_arn);
    assert_eq!(admin.views("us-east-1").len(), 1);
    assert_eq!(second.default_view, DefaultView::AlreadySet(first.view_arn));
}

#[tokio::test]
async fn turn_on_twice_returns_the_existing_arn() {
    let admin = MemoryIndexAdmin::new();
    let workflow = bootstrap(&admin);

    let first = workflow.turn_on_index("ap-southeast-2").await.unwrap();
    let second = workflow.turn_on_index("ap-southeast-2").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        admin.calls(),
        vec![
            "create_index ap-southeast-2",
            "create_index ap-southeast-2",
            "get_index ap-southeast-2",
        ]
    );
}

#[tokio::test]
async fn existing_aggregator_is_not_an_error() {
    let admin = MemoryIndexAdmin::new();
    admin.seed_index("us-east-1", IndexType::Aggregator);

    let arn = bootstrap(&admin).promote_aggregator("us-east-1").await.unwrap();
    assert_eq!(arn, MemoryIndexAdmin::index_arn("us-east-1"));
    assert_eq!(admin.index_type("us-east-1"), Some(IndexType::Aggregator));
}

#[tokio::test]
async fn existing_view_is_found_across_pages() {
    let admin = MemoryIndexAdmin::new();
    admin.seed_view("us-east-1", "someone-elses-view");
    admin.seed_view("us-east-1", "another");
    let ours = admin.seed_view("us-east-1", "tag-inventory-all-resources");

    let arn = bootstrap(&admin).ensure_view("us-east-1").await.unwrap();

    assert_eq!(arn, ours);
    let listings = admin
        .calls()
        .iter()
        .filter(|c| c.starts_with("list_views"))
        .count();
    assert_eq!(listings, 3);
}

#[tokio::test]
async fn view_name_must_match_exactly() {
    let admin = MemoryIndexAdmin::new();
    admin.seed_view("us-east-1", "tag-inventory-all-resources-old");
    admin.fail("create_view", IndexError::Conflict("exists".into()));

    let err = bootstrap(&admin).ensure_view("us-east-1").await.unwrap_err();
    assert!(matches!(err, BootstrapError::ViewNotFound(name) if name == "tag-inventory-all-resources"));
}

#[tokio::test]
async fn other_default_view_is_left_alone() {
    let admin = MemoryIndexAdmin::new();
    let theirs = admin.seed_view("us-east-1", "theirs");
    bootstrap(&admin)
        .ensure_default_view("us-east-1", &theirs)
        .await
        .unwrap();

    let outcome = bootstrap(&admin).run().await.unwrap();
    assert_eq!(outcome.default_view, DefaultView::AlreadySet(theirs.clone()));
    assert_eq!(admin.default_view("us-east-1"), Some(theirs));
}

#[tokio::test]
async fn not_found_default_lookup_still_associates() {
    let admin = MemoryIndexAdmin::new();
    admin.missing_default_view_is_error();

    let outcome = bootstrap(&admin).run().await.unwrap();
    assert_eq!(outcome.default_view, DefaultView::Associated(outcome.view_arn.clone()));
}

#[tokio::test]
async fn failed_association_is_logged_not_fatal() {
    let admin = MemoryIndexAdmin::new();
    admin.fail(
        "associate_default_view",
        IndexError::AccessDenied("not authorized".into()),
    );

    let outcome = bootstrap(&admin).run().await.unwrap();
    assert!(matches!(outcome.default_view, DefaultView::Failed(ref reason) if reason.contains("not authorized")));
    assert_eq!(admin.default_view("us-east-1"), None);
}

#[tokio::test]
async fn default_view_can_be_disabled() {
    let admin = MemoryIndexAdmin::new();
    let mut config = config();
    config.set_default_view = false;

    let outcome = IndexBootstrap::new(Arc::new(admin.clone()), config)
        .run()
        .await
        .unwrap();
    assert_eq!(outcome.default_view, DefaultView::Skipped);
    assert!(!admin.calls().iter().any(|c| c.contains("default_view")));
}

#[tokio::test]
async fn denied_index_creation_stops_the_run() {
    let admin = MemoryIndexAdmin::new();
    admin.fail("create_index", IndexError::AccessDenied("scp".into()));

    let err = bootstrap(&admin).run().await.unwrap_err();
    assert!(matches!(err, BootstrapError::EnableIndex { ref region, .. } if region == "us-east-1"));
    assert!(err.kind().needs_operator());
    assert!(admin.views("us-east-1").is_empty());
}

#[tokio::test]
async fn no_regions_is_rejected() {
    let admin = MemoryIndexAdmin::new();
    let config = BootstrapConfig::new(Vec::new(), "us-east-1");
    let err = IndexBootstrap::new(Arc::new(admin.clone()), config)
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, BootstrapError::NoRegions));
    assert!(admin.calls().is_empty());
}

// ──────────────────────────────────────────────
// Custom-resource requests
// ──────────────────────────────────────────────

fn request(request_type: &str) -> CustomResourceRequest {
    serde_json::from_value(json!({
        "RequestType": request_type,
        "LogicalResourceId": "ResourceExplorerIndex",
        "PhysicalResourceId": "previous-id",
        "RequestId": "req-1",
        "StackId": "stack-1",
        "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:index",
        "ResourceProperties": {
            "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:index",
            "ENABLED_REGIONS": ["us-east-1", "eu-west-1"],
            "AGGREGATOR_INDEX_REGION": "us-east-1"
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn create_answers_with_view_arn() {
    let admin = MemoryIndexAdmin::new();
    let response = handle_request(Arc::new(admin.clone()), &config(), &request("Create")).await;

    assert_eq!(response.status, ResponseStatus::Success);
    let view = admin.views("us-east-1").remove(0);
    assert_eq!(response.physical_resource_id.as_deref(), Some(view.as_str()));
    assert_eq!(response.data.get("ViewArn"), Some(&view));
    assert_eq!(response.request_id.as_deref(), Some("req-1"));
}

#[tokio::test]
async fn update_reruns_the_workflow() {
    let admin = MemoryIndexAdmin::new();
    let created = handle_request(Arc::new(admin.clone()), &config(), &request("Create")).await;
    let updated = handle_request(Arc::new(admin.clone()), &config(), &request("Update")).await;

    assert_eq!(updated.status, ResponseStatus::Success);
    assert_eq!(created.physical_resource_id, updated.physical_resource_id);
}

#[tokio::test]
async fn delete_touches_nothing() {
    let admin = MemoryIndexAdmin::new();
    let response = handle_request(Arc::new(admin.clone()), &config(), &request("Delete")).await;

    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(response.physical_resource_id.as_deref(), Some("previous-id"));
    assert!(response.data.is_empty());
    assert!(admin.calls().is_empty());
}

#[tokio::test]
async fn workflow_failure_answers_failed_with_reason() {
    let admin = MemoryIndexAdmin::new();
    admin.fail("create_view", IndexError::Other("quota exceeded".into()));

    let response = handle_request(Arc::new(admin.clone()), &config(), &request("Create")).await;

    assert_eq!(response.status, ResponseStatus::Failed);
    let reason = response.reason.unwrap();
    assert!(reason.contains("problem creating view 'tag-inventory-all-resources'"));
    assert!(reason.contains("quota exceeded"));
}
