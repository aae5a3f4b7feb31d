use std::sync::Arc;

use tag_inventory_aggregate::{AggregationPipeline, CheckpointSink, Orchestrator, RetryPolicy};

/// What an orchestrator under test is built from.
///
/// The pipeline's collaborators are in-memory fakes owned by the test's
/// [`Fixture`](crate::fixtures::Fixture), which inspects them afterwards.
pub struct OrchestratorParts {
    pub pipeline: AggregationPipeline,
    /// Must receive one checkpoint per merged page.
    pub checkpoints: Arc<dyn CheckpointSink>,
    /// Retry budget for transient search failures. The suite uses a zero
    /// interval so tests never sleep.
    pub retry: RetryPolicy,
}

/// Builds the orchestrator being checked. Called once per obligation with
/// fresh parts.
pub trait OrchestratorFactory: Send + Sync {
    type Orchestrator: Orchestrator;

    fn build(&self, parts: OrchestratorParts) -> Self::Orchestrator;
}
