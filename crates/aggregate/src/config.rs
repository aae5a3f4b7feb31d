use serde::Deserialize;
use tag_inventory_core::step::DEFAULT_MAX_RESULTS;

/// Settings of a spoke-account aggregation run (`[spoke]` in the config file).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregationConfig {
    /// View the Search step pages through.
    pub view_arn: String,
    /// Central bucket the final object is written to.
    pub central_bucket: String,
    /// Role in the central account allowed to write to `central_bucket`.
    pub central_role_arn: String,
    /// Topic announcing completed runs. No notification is sent when unset.
    #[serde(default)]
    pub topic_arn: Option<String>,
    /// Account reported in the completion message. Falls back to the owning
    /// account of the first aggregated resource.
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: i32,
    #[serde(default)]
    pub query_string: String,
    /// Drop a resource already present under the same tag pair.
    #[serde(default)]
    pub dedup_by_arn: bool,
}

fn default_max_results() -> i32 {
    DEFAULT_MAX_RESULTS
}

impl AggregationConfig {
    pub fn new(
        view_arn: impl Into<String>,
        central_bucket: impl Into<String>,
        central_role_arn: impl Into<String>,
    ) -> Self {
        AggregationConfig {
            view_arn: view_arn.into(),
            central_bucket: central_bucket.into(),
            central_role_arn: central_role_arn.into(),
            topic_arn: None,
            account_id: None,
            max_results: DEFAULT_MAX_RESULTS,
            query_string: String::new(),
            dedup_by_arn: false,
        }
    }

    pub fn with_topic(mut self, topic_arn: impl Into<String>) -> Self {
        self.topic_arn = Some(topic_arn.into());
        self
    }
}
