use serde::Deserialize;

/// Name of the view spoke runs search through.
pub const DEFAULT_VIEW_NAME: &str = "tag-inventory-all-resources";

/// Settings of the bootstrap workflow (`[bootstrap]` in the config file).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Regions to turn the index on in.
    pub enabled_regions: Vec<String>,
    /// Region whose index becomes the aggregator and hosts the view.
    pub aggregator_region: String,
    #[serde(default = "default_view_name")]
    pub view_name: String,
    /// Index properties the view exposes to search results.
    #[serde(default = "default_included_properties")]
    pub included_properties: Vec<String>,
    /// Make the view the account default when none is set.
    #[serde(default = "default_true")]
    pub set_default_view: bool,
}

fn default_view_name() -> String {
    DEFAULT_VIEW_NAME.to_string()
}

fn default_included_properties() -> Vec<String> {
    vec!["tags".to_string()]
}

fn default_true() -> bool {
    true
}

impl BootstrapConfig {
    pub fn new(enabled_regions: Vec<String>, aggregator_region: impl Into<String>) -> Self {
        BootstrapConfig {
            enabled_regions,
            aggregator_region: aggregator_region.into(),
            view_name: default_view_name(),
            included_properties: default_included_properties(),
            set_default_view: true,
        }
    }
}

/// Split a comma-separated region list, dropping blanks and duplicates while
/// keeping the first-seen order.
pub fn parse_regions(list: &str) -> Vec<String> {
    let mut regions: Vec<String> = Vec::new();
    for region in list.split(',').map(str::trim).filter(|r| !r.is_empty()) {
        if !regions.iter().any(|r| r == region) {
            regions.push(region.to_string());
        }
    }
    regions
}
