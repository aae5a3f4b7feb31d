use std::future::Future;

use super::{get, put, TestResult, CONFORMANCE_BUCKET};
use crate::{ObjectStore, ObjectStoreError};

pub(super) async fn run_copy_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "copy",
            "copy_writes_destination_and_keeps_source",
            copy_writes_destination_and_keeps_source(factory).await,
        ),
        TestResult::from_result(
            "copy",
            "copy_of_missing_source_is_not_found",
            copy_of_missing_source_is_not_found(factory).await,
        ),
    ]
}

async fn copy_writes_destination_and_keeps_source<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    put(&store, "tables/data.gz", b"csv-bytes").await?;
    store
        .copy(
            CONFORMANCE_BUCKET,
            "tables/data.gz",
            CONFORMANCE_BUCKET,
            "report-2024-01-02.csv.gz",
        )
        .await
        .map_err(|e| format!("copy failed: {}", e))?;
    if get(&store, "report-2024-01-02.csv.gz").await? != b"csv-bytes" {
        return Err("destination does not hold the source bytes".to_string());
    }
    if get(&store, "tables/data.gz").await? != b"csv-bytes" {
        return Err("source changed after copy".to_string());
    }
    Ok(())
}

async fn copy_of_missing_source_is_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    match store
        .copy(CONFORMANCE_BUCKET, "nope", CONFORMANCE_BUCKET, "dest")
        .await
    {
        Err(ObjectStoreError::NotFound { .. }) => Ok(()),
        Err(other) => Err(format!("expected NotFound, got {}", other)),
        Ok(()) => Err("copy of a missing source succeeded".to_string()),
    }
}
