//! O3: a non-transient failure ends the run with an error, without writing
//! or announcing anything.

use tag_inventory_aggregate::{Orchestrator, RunRequest};
use tag_inventory_storage::SearchError;

use crate::fixtures::{run_date, three_pages, Fixture, RUN_ID};
use crate::traits::OrchestratorFactory;

pub async fn test_o03_fatal_error<F: OrchestratorFactory>(factory: &F) -> Result<(), String> {
    let fixture = Fixture::new(three_pages()).fail_page(
        Some("page-2"),
        SearchError::AccessDenied("not authorized to search view".into()),
        1,
    );
    let err = match fixture
        .orchestrator(factory)
        .run(RunRequest::new(RUN_ID, run_date()))
        .await
    {
        Ok(_) => return Err("O3: run succeeded despite a denied search".into()),
        Err(err) => err,
    };
    if err.is_transient() {
        return Err(format!("O3: access denied reported as transient: {}", err));
    }
    if !fixture.central_keys().is_empty() {
        return Err(format!(
            "O3: failed run wrote {:?}",
            fixture.central_keys()
        ));
    }
    if !fixture.notifier.published().is_empty() {
        return Err("O3: failed run published a notification".into());
    }
    Ok(())
}
