//! tag-inventory-report: materializes the daily CSV report in the central
//! account.
//!
//! The pipeline is a fixed chain of query-engine jobs. Each job is submitted,
//! polled to a terminal state under a [`PollPolicy`], and must succeed before
//! the next statement is built. The CSV table's data file is then located via
//! its manifest, copied to `report-<date>.csv.gz`, and the scratch objects and
//! table are removed.

pub mod config;
pub mod error;
pub mod location;
pub mod pipeline;
pub mod poll;
pub mod statements;
pub mod step;

pub use config::ReportConfig;
pub use error::ReportError;
pub use location::S3Location;
pub use pipeline::{DateSource, ReportOutcome, ReportPipeline};
pub use poll::{run_job, CompletedJob, PollPolicy};
pub use statements::ReportStatements;
pub use step::ReportStep;
