use serde::Deserialize;

use crate::poll::PollPolicy;

/// Settings of the report pipeline (`[report]` in the config file).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Catalog database holding the crawled inventory table.
    pub database: String,
    /// Crawled table the spoke objects land in.
    pub tag_inventory_table: String,
    pub work_group: String,
    /// Bucket holding the derived Parquet table.
    pub athena_bucket: String,
    /// Bucket the CSV report is published to.
    pub report_bucket: String,
    #[serde(default)]
    pub poll: PollPolicy,
}
