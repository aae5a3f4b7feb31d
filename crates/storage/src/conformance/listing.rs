use std::future::Future;

use super::{put, TestResult, CONFORMANCE_BUCKET};
use crate::ObjectStore;

pub(super) async fn run_listing_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "listing",
            "list_returns_only_prefixed_keys_sorted",
            list_returns_only_prefixed_keys_sorted(factory).await,
        ),
        TestResult::from_result(
            "listing",
            "list_of_empty_prefix_range_is_empty",
            list_of_empty_prefix_range_is_empty(factory).await,
        ),
    ]
}

async fn list_returns_only_prefixed_keys_sorted<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    put(&store, "tables/b.gz", b"b").await?;
    put(&store, "tables/a.gz", b"a").await?;
    put(&store, "report-2024-01-02.csv.gz", b"r").await?;
    let keys = store
        .list_keys(CONFORMANCE_BUCKET, "tables/")
        .await
        .map_err(|e| format!("list failed: {}", e))?;
    if keys != vec!["tables/a.gz".to_string(), "tables/b.gz".to_string()] {
        return Err(format!("unexpected listing: {:?}", keys));
    }
    Ok(())
}

async fn list_of_empty_prefix_range_is_empty<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    put(&store, "d=2024-01-02/run.json", b"[]").await?;
    let keys = store
        .list_keys(CONFORMANCE_BUCKET, "tables/")
        .await
        .map_err(|e| format!("list failed: {}", e))?;
    if !keys.is_empty() {
        return Err(format!("expected no keys, got {:?}", keys));
    }
    Ok(())
}
