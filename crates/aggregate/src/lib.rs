//! tag-inventory-aggregate: the spoke-account aggregation pipeline.
//!
//! The run is a small state machine, `Search -> Merge -> (Search | WriteFinal)
//! -> Notify -> Done`. Each step is an async method on
//! [`AggregationPipeline`], so an external orchestrator can drive them one at
//! a time. [`LocalOrchestrator`] is the in-process driver used by the CLI: it
//! owns the loop, retries transient search failures, and checkpoints the
//! accumulator after every merge.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod state;

pub use checkpoint::{Checkpoint, CheckpointSink, MemoryCheckpoints, NoCheckpoints};
pub use config::AggregationConfig;
pub use error::{AggregationError, CheckpointError};
pub use orchestrator::{LocalOrchestrator, Orchestrator, RetryPolicy, RunRequest, RunSummary};
pub use pipeline::{AggregationContext, AggregationPipeline, CompletionMessage, WrittenObject};
pub use state::AggregationState;
