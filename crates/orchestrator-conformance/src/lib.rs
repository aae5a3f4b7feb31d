//! Orchestrator conformance suite.
//!
//! Provides an `OrchestratorFactory` trait and `orchestrator_conformance_tests!`
//! macro for checking any driver of the aggregation state machine against
//! the obligations every orchestrator owes a run: the loop terminates, resume
//! continues where the checkpoint left off, fatal errors write nothing, the
//! object is written once and then announced once, every iteration is
//! checkpointed, transient search failures are retried without merging a
//! page twice, and an empty index still produces an (empty) object.

pub mod fixtures;
pub mod suite;
pub mod tests;
pub mod traits;

pub use traits::*;
