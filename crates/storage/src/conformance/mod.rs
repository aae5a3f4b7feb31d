//! Conformance test suite for `ObjectStore` implementations.
//!
//! A backend-agnostic suite that any `ObjectStore` can run to show it honors
//! the contract the pipelines rely on. The suite covers:
//!
//! - **Round trip**: bytes read back equal bytes written, overwrites replace
//! - **Copy**: destination receives the bytes, source is left in place
//! - **Delete**: removes the object, deleting a missing key succeeds
//! - **Listing**: prefix listing returns exactly the matching keys, sorted
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty store for each test:
//!
//! ```ignore
//! use tag_inventory_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn s3_conformance() {
//!     let report = run_conformance_suite(|| async { scratch_bucket_store().await }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod copy;
mod delete;
mod listing;
mod round_trip;

use std::fmt;
use std::future::Future;

use crate::record::PutObject;
use crate::ObjectStore;

/// Bucket every conformance test writes to.
pub const CONFORMANCE_BUCKET: &str = "conformance-bucket";

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "round_trip", "copy").
    pub category: String,
    /// Test name (e.g. "put_then_get_returns_same_bytes").
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against an object store.
///
/// The `factory` function is called once per test to create a fresh, empty
/// store, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: ObjectStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(round_trip::run_round_trip_tests(&factory).await);
    results.extend(copy::run_copy_tests(&factory).await);
    results.extend(delete::run_delete_tests(&factory).await);
    results.extend(listing::run_listing_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_object(key: &str, body: &[u8]) -> PutObject {
    PutObject {
        bucket: CONFORMANCE_BUCKET.to_string(),
        key: key.to_string(),
        body: body.to_vec(),
        content_type: Some("application/json".to_string()),
        checksum_sha256: None,
    }
}

async fn put(store: &impl ObjectStore, key: &str, body: &[u8]) -> Result<(), String> {
    store
        .put(make_object(key, body))
        .await
        .map_err(|e| format!("put {} failed: {}", key, e))
}

async fn get(store: &impl ObjectStore, key: &str) -> Result<Vec<u8>, String> {
    store
        .get(CONFORMANCE_BUCKET, key)
        .await
        .map_err(|e| format!("get {} failed: {}", key, e))
}
