use serde::{Deserialize, Serialize};

/// Tag name recorded for a resource that carries no tags at all.
pub const UNTAGGED_NAME: &str = "NoTag";
/// Tag value paired with [`UNTAGGED_NAME`].
pub const UNTAGGED_VALUE: &str = "NoValue";

/// One key/value tag pair as reported by the resource index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Tag {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A single discovered resource at the time it was fetched.
///
/// Records are never mutated by the pipeline; merging only copies them into
/// tag groups. The `PascalCase` wire form is what the central table's JSON
/// SerDe reads (`Arn`, `OwningAccountId`, `Region`, `Service`,
/// `ResourceType`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRecord {
    pub arn: String,
    pub owning_account_id: String,
    pub region: String,
    pub service: String,
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    /// RFC 3339 timestamp of the index's last observation, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reported_at: Option<String>,
}

impl ResourceRecord {
    /// The tag pairs this resource is grouped under.
    ///
    /// A resource with no tags is grouped under the sentinel
    /// `("NoTag", "NoValue")` pair so untagged resources stay visible in
    /// every report.
    pub fn effective_tags(&self) -> Vec<Tag> {
        if self.tags.is_empty() {
            vec![Tag::new(UNTAGGED_NAME, UNTAGGED_VALUE)]
        } else {
            self.tags.clone()
        }
    }

    pub fn is_untagged(&self) -> bool {
        self.tags.is_empty()
    }
}

/// The `Count` block of a search response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchCount {
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub total_resources: i64,
}

/// One page returned by the resource search adapter.
///
/// `next_token` being present is the only signal that more pages remain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageResult {
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(default)]
    pub count: SearchCount,
}

impl PageResult {
    pub fn has_more(&self) -> bool {
        self.next_token.is_some()
    }
}
