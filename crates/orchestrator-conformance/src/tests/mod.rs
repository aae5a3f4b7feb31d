//! One module per orchestrator obligation. Each check takes the factory and
//! returns `Err` with a description of the first violation it finds.

pub mod o03_fatal_error;
pub mod o04_write_then_notify;
pub mod o06_transient_retry;
pub mod o07_empty_index;
