//! O6: transient search failures are retried within the policy's budget and
//! the page is merged once. Past the budget the run fails without writing.

use tag_inventory_aggregate::{Orchestrator, RunRequest};
use tag_inventory_storage::SearchError;

use crate::fixtures::{arn_counts, run_date, three_pages, Fixture, RUN_ID};
use crate::traits::OrchestratorFactory;

pub async fn test_o06_transient_retry<F: OrchestratorFactory>(
    factory: &F,
) -> Result<(), String> {
    let fixture = Fixture::new(three_pages()).fail_page(
        Some("page-2"),
        SearchError::Throttled("Rate exceeded".into()),
        2,
    );
    let summary = fixture
        .orchestrator(factory)
        .run(RunRequest::new(RUN_ID, run_date()))
        .await
        .map_err(|e| format!("O6: run failed despite retry budget: {}", e))?;

    if summary.search_calls != 5 {
        return Err(format!(
            "O6: expected 5 search calls (3 pages, 2 retries), summary says {}",
            summary.search_calls
        ));
    }
    if fixture.checkpoints.saved().len() != 3 {
        return Err(format!(
            "O6: retried page produced {} checkpoints",
            fixture.checkpoints.saved().len()
        ));
    }
    let counts = arn_counts(&fixture.written_groups()?);
    if counts.iter().any(|(arn, n)| arn == "arn:i-2" && *n != 2) {
        return Err(format!("O6: retried page merged more than once: {:?}", counts));
    }
    Ok(())
}

pub async fn test_o06_retry_budget_exhausted<F: OrchestratorFactory>(
    factory: &F,
) -> Result<(), String> {
    let fixture = Fixture::new(three_pages()).fail_page(
        Some("page-2"),
        SearchError::Timeout("read timed out".into()),
        100,
    );
    match fixture
        .orchestrator(factory)
        .run(RunRequest::new(RUN_ID, run_date()))
        .await
    {
        Ok(_) => Err("O6: run succeeded with every page-2 search failing".into()),
        Err(err) if !err.is_transient() => Err(format!(
            "O6: exhausted retries should surface the transient error, got {}",
            err
        )),
        Err(_) if !fixture.central_keys().is_empty() => {
            Err("O6: run wrote an object after exhausting retries".into())
        }
        Err(_) => Ok(()),
    }
}
