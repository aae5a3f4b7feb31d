use std::future::Future;

use super::{get, put, TestResult, CONFORMANCE_BUCKET};
use crate::{ObjectStore, ObjectStoreError};

pub(super) async fn run_round_trip_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "round_trip",
            "put_then_get_returns_same_bytes",
            put_then_get_returns_same_bytes(factory).await,
        ),
        TestResult::from_result(
            "round_trip",
            "overwrite_replaces_body",
            overwrite_replaces_body(factory).await,
        ),
        TestResult::from_result(
            "round_trip",
            "get_missing_key_is_not_found",
            get_missing_key_is_not_found(factory).await,
        ),
        TestResult::from_result(
            "round_trip",
            "keys_with_partition_prefix_round_trip",
            keys_with_partition_prefix_round_trip(factory).await,
        ),
    ]
}

async fn put_then_get_returns_same_bytes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let body = br#"[{"TagName":"env","TagValue":"prod","Resources":[]}]"#;
    put(&store, "object.json", body).await?;
    let read = get(&store, "object.json").await?;
    if read != body {
        return Err(format!("expected {} bytes back, got {}", body.len(), read.len()));
    }
    Ok(())
}

async fn overwrite_replaces_body<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    put(&store, "object.json", b"first").await?;
    put(&store, "object.json", b"second").await?;
    let read = get(&store, "object.json").await?;
    if read != b"second" {
        return Err(format!(
            "expected overwritten body 'second', got '{}'",
            String::from_utf8_lossy(&read)
        ));
    }
    Ok(())
}

async fn get_missing_key_is_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    match store.get(CONFORMANCE_BUCKET, "missing.json").await {
        Err(ObjectStoreError::NotFound { key, .. }) if key == "missing.json" => Ok(()),
        Err(other) => Err(format!("expected NotFound, got {}", other)),
        Ok(_) => Err("expected NotFound, got an object".to_string()),
    }
}

async fn keys_with_partition_prefix_round_trip<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let key = "d=2024-01-02/run-0001.json";
    put(&store, key, b"[]").await?;
    let read = get(&store, key).await?;
    if read != b"[]" {
        return Err(format!("unexpected body under '{}'", key));
    }
    Ok(())
}
