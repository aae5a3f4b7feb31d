//! O4: exactly one write, then exactly one notification naming it.

use tag_inventory_aggregate::{Orchestrator, RunRequest};

use crate::fixtures::{object_key, run_date, three_pages, Fixture, CENTRAL_BUCKET, RUN_ID, TOPIC_ARN};
use crate::traits::OrchestratorFactory;

pub async fn test_o04_write_then_notify<F: OrchestratorFactory>(
    factory: &F,
) -> Result<(), String> {
    let fixture = Fixture::new(three_pages());
    let summary = fixture
        .orchestrator(factory)
        .run(RunRequest::new(RUN_ID, run_date()))
        .await
        .map_err(|e| format!("O4: run failed: {}", e))?;

    let entries = fixture.log.entries();
    let puts = entries.iter().filter(|e| e.starts_with("put ")).count();
    let publishes = entries.iter().filter(|e| e.starts_with("publish ")).count();
    if puts != 1 || publishes != 1 {
        return Err(format!(
            "O4: expected one put and one publish, saw {} and {} in {:?}",
            puts, publishes, entries
        ));
    }
    let put_at = fixture.log.position("put ");
    let publish_at = fixture.log.position("publish ");
    if put_at >= publish_at {
        return Err(format!("O4: notification did not follow the write: {:?}", entries));
    }
    if !entries.iter().any(|e| e == &format!("put {}/{}", CENTRAL_BUCKET, object_key())) {
        return Err(format!("O4: object not written to {}", object_key()));
    }

    let published = fixture.notifier.published();
    let message = &published[0];
    if message.topic_arn != TOPIC_ARN {
        return Err(format!("O4: published to {}", message.topic_arn));
    }
    if !message.message.contains(&object_key()) {
        return Err(format!(
            "O4: notification does not name the object: {}",
            message.message
        ));
    }
    if summary.message_id.is_none() {
        return Err("O4: summary lost the message id".into());
    }
    Ok(())
}
