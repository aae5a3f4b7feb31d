//! Configuration file plus environment overrides.
//!
//! The file has one optional section per command family:
//!
//! ```toml
//! [spoke]
//! view_arn = "arn:aws:resource-explorer-2:us-east-1:111111111111:view/tag-inventory-all-resources/abc"
//! central_bucket = "central-tag-inventory"
//! central_role_arn = "arn:aws:iam::222222222222:role/tag-inventory-put"
//!
//! [report]
//! database = "tag_inventory"
//! tag_inventory_table = "spoke_results"
//! work_group = "tag-inventory"
//! athena_bucket = "tag-inventory-athena"
//! report_bucket = "tag-inventory-reports"
//!
//! [bootstrap]
//! enabled_regions = ["us-east-1", "eu-west-1"]
//! aggregator_region = "us-east-1"
//! ```
//!
//! Environment variables use the deployment's names and win over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tag_inventory_aggregate::{AggregationConfig, RetryPolicy};
use tag_inventory_bootstrap::{parse_regions, BootstrapConfig, DEFAULT_VIEW_NAME};
use tag_inventory_report::{PollPolicy, ReportConfig};

/// File read when `--config` is not given, if it exists.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "tag-inventory.toml";

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("error reading config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing config '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing configuration: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SpokeSection {
    pub view_arn: Option<String>,
    pub central_bucket: Option<String>,
    pub central_role_arn: Option<String>,
    pub topic_arn: Option<String>,
    pub account_id: Option<String>,
    pub max_results: Option<i32>,
    pub query_string: Option<String>,
    pub dedup_by_arn: Option<bool>,
    pub retry: Option<RetryPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ReportSection {
    pub database: Option<String>,
    pub tag_inventory_table: Option<String>,
    pub work_group: Option<String>,
    pub athena_bucket: Option<String>,
    pub report_bucket: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub max_poll_attempts: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BootstrapSection {
    pub enabled_regions: Option<Vec<String>>,
    pub aggregator_region: Option<String>,
    pub view_name: Option<String>,
    pub set_default_view: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    #[serde(default)]
    pub spoke: SpokeSection,
    #[serde(default)]
    pub report: ReportSection,
    #[serde(default)]
    pub bootstrap: BootstrapSection,
}

impl FileConfig {
    /// Read `path`, or [`DEFAULT_CONFIG_FILE`] when it exists, or nothing.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(FileConfig::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Apply environment overrides; `lookup` is `std::env::var` in production.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let spoke = &mut self.spoke;
        override_with(&mut spoke.view_arn, var("VIEW_ARN"));
        override_with(&mut spoke.central_bucket, var("CENTRAL_BUCKET_NAME"));
        override_with(&mut spoke.central_role_arn, var("CENTRAL_ROLE_ARN"));
        override_with(&mut spoke.topic_arn, var("TOPIC_ARN"));

        let report = &mut self.report;
        override_with(&mut report.database, var("DATABASE"));
        override_with(&mut report.tag_inventory_table, var("TAG_INVENTORY_TABLE"));
        override_with(&mut report.work_group, var("WORKGROUP"));
        override_with(&mut report.athena_bucket, var("ATHENA_BUCKET"));
        override_with(&mut report.report_bucket, var("REPORT_BUCKET"));

        let bootstrap = &mut self.bootstrap;
        override_with(
            &mut bootstrap.enabled_regions,
            var("ENABLED_REGIONS").map(|list| parse_regions(&list)),
        );
        override_with(&mut bootstrap.aggregator_region, var("AGGREGATOR_INDEX_REGION"));
        self
    }

    pub fn aggregation(&self) -> Result<(AggregationConfig, RetryPolicy), ConfigError> {
        let s = &self.spoke;
        let mut missing = Missing::default();
        let view_arn = missing.require(&s.view_arn, "spoke.view_arn", "VIEW_ARN");
        let bucket = missing.require(&s.central_bucket, "spoke.central_bucket", "CENTRAL_BUCKET_NAME");
        let role = missing.require(&s.central_role_arn, "spoke.central_role_arn", "CENTRAL_ROLE_ARN");
        missing.finish()?;

        let mut config = AggregationConfig::new(view_arn, bucket, role);
        config.topic_arn = s.topic_arn.clone();
        config.account_id = s.account_id.clone();
        if let Some(max_results) = s.max_results {
            config.max_results = max_results;
        }
        if let Some(query) = &s.query_string {
            config.query_string = query.clone();
        }
        config.dedup_by_arn = s.dedup_by_arn.unwrap_or(false);
        Ok((config, s.retry.unwrap_or_default()))
    }

    pub fn report(&self) -> Result<ReportConfig, ConfigError> {
        let r = &self.report;
        let mut missing = Missing::default();
        let database = missing.require(&r.database, "report.database", "DATABASE");
        let table = missing.require(
            &r.tag_inventory_table,
            "report.tag_inventory_table",
            "TAG_INVENTORY_TABLE",
        );
        let work_group = missing.require(&r.work_group, "report.work_group", "WORKGROUP");
        let athena_bucket = missing.require(&r.athena_bucket, "report.athena_bucket", "ATHENA_BUCKET");
        let report_bucket = missing.require(&r.report_bucket, "report.report_bucket", "REPORT_BUCKET");
        missing.finish()?;
        if r.max_poll_attempts == Some(0) {
            return Err(ConfigError::Invalid(
                "report.max_poll_attempts must be at least 1".into(),
            ));
        }

        let defaults = PollPolicy::default();
        Ok(ReportConfig {
            database,
            tag_inventory_table: table,
            work_group,
            athena_bucket,
            report_bucket,
            poll: PollPolicy::new(
                r.poll_interval_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.interval),
                r.max_poll_attempts.unwrap_or(defaults.max_attempts),
            ),
        })
    }

    pub fn bootstrap(&self) -> Result<BootstrapConfig, ConfigError> {
        let b = &self.bootstrap;
        let mut missing = Missing::default();
        let regions = match &b.enabled_regions {
            Some(regions) if !regions.is_empty() => regions.clone(),
            _ => {
                missing.push("bootstrap.enabled_regions", "ENABLED_REGIONS");
                Vec::new()
            }
        };
        let aggregator = missing.require(
            &b.aggregator_region,
            "bootstrap.aggregator_region",
            "AGGREGATOR_INDEX_REGION",
        );
        missing.finish()?;

        let mut config = BootstrapConfig::new(regions, aggregator);
        config.view_name = b
            .view_name
            .clone()
            .unwrap_or_else(|| DEFAULT_VIEW_NAME.to_string());
        config.set_default_view = b.set_default_view.unwrap_or(true);
        Ok(config)
    }

    /// Bootstrap view settings without requiring regions, for requests that
    /// carry their own.
    pub fn bootstrap_defaults(&self) -> BootstrapConfig {
        let mut config = BootstrapConfig::new(Vec::new(), String::new());
        if let Some(name) = &self.bootstrap.view_name {
            config.view_name = name.clone();
        }
        config.set_default_view = self.bootstrap.set_default_view.unwrap_or(true);
        config
    }
}

fn override_with<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Collects every missing required value so one error names them all.
#[derive(Default)]
struct Missing(Vec<String>);

impl Missing {
    fn require(&mut self, value: &Option<String>, key: &str, env: &str) -> String {
        match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => value.to_string(),
            None => {
                self.push(key, env);
                String::new()
            }
        }
    }

    fn push(&mut self, key: &str, env: &str) {
        self.0.push(format!("{} (or {})", key, env));
    }

    fn finish(self) -> Result<(), ConfigError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(self.0))
        }
    }
}
