//! The in-process orchestrator against every obligation.

use tag_inventory_aggregate::LocalOrchestrator;
use tag_inventory_orchestrator_conformance::{
    orchestrator_conformance_tests, OrchestratorFactory, OrchestratorParts,
};

struct LocalFactory;

impl OrchestratorFactory for LocalFactory {
    type Orchestrator = LocalOrchestrator;

    fn build(&self, parts: OrchestratorParts) -> LocalOrchestrator {
        LocalOrchestrator::new(parts.pipeline)
            .with_retry(parts.retry)
            .with_checkpoints(parts.checkpoints)
    }
}

orchestrator_conformance_tests!(LocalFactory);
