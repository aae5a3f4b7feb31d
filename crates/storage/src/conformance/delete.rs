use std::future::Future;

use super::{put, TestResult, CONFORMANCE_BUCKET};
use crate::{ObjectStore, ObjectStoreError};

pub(super) async fn run_delete_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "delete",
            "delete_removes_object",
            delete_removes_object(factory).await,
        ),
        TestResult::from_result(
            "delete",
            "delete_missing_key_succeeds",
            delete_missing_key_succeeds(factory).await,
        ),
        TestResult::from_result(
            "delete",
            "delete_twice_succeeds",
            delete_twice_succeeds(factory).await,
        ),
    ]
}

async fn delete_removes_object<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    put(&store, "scratch.json", b"x").await?;
    store
        .delete(CONFORMANCE_BUCKET, "scratch.json")
        .await
        .map_err(|e| format!("delete failed: {}", e))?;
    match store.get(CONFORMANCE_BUCKET, "scratch.json").await {
        Err(ObjectStoreError::NotFound { .. }) => Ok(()),
        Err(other) => Err(format!("expected NotFound after delete, got {}", other)),
        Ok(_) => Err("object still readable after delete".to_string()),
    }
}

async fn delete_missing_key_succeeds<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    store
        .delete(CONFORMANCE_BUCKET, "never-written.json")
        .await
        .map_err(|e| format!("deleting a missing key failed: {}", e))
}

async fn delete_twice_succeeds<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    put(&store, "tables/manifest.csv", b"s3://bucket/tables/data.gz").await?;
    for attempt in 1..=2 {
        store
            .delete(CONFORMANCE_BUCKET, "tables/manifest.csv")
            .await
            .map_err(|e| format!("delete #{} failed: {}", attempt, e))?;
    }
    Ok(())
}
