//! O7: a view with no resources still produces one object, an empty array.

use tag_inventory_aggregate::{Orchestrator, RunRequest};

use crate::fixtures::{object_key, run_date, Fixture, CENTRAL_BUCKET, RUN_ID};
use crate::traits::OrchestratorFactory;

pub async fn test_o07_empty_index<F: OrchestratorFactory>(factory: &F) -> Result<(), String> {
    let fixture = Fixture::new(vec![Vec::new()]);
    let summary = fixture
        .orchestrator(factory)
        .run(RunRequest::new(RUN_ID, run_date()))
        .await
        .map_err(|e| format!("O7: run failed: {}", e))?;

    let object = fixture
        .store
        .object(CENTRAL_BUCKET, &object_key())
        .ok_or("O7: empty index wrote no object")?;
    if object.body != b"[]" {
        return Err(format!(
            "O7: expected '[]', wrote '{}'",
            String::from_utf8_lossy(&object.body)
        ));
    }
    if summary.written.tag_groups != 0 || fixture.notifier.published().len() != 1 {
        return Err("O7: empty run should still be announced once with zero groups".into());
    }
    Ok(())
}
