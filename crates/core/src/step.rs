//! Step payloads exchanged with the orchestrator.
//!
//! Field names are part of the orchestration contract and stay `PascalCase`
//! (`NextToken`, `Results`, `PreviousResults`, `TagName`, `TagValue`,
//! `Resources`). The grouping list under `Results` keeps its lowercase
//! `flatten` key.

use serde::{Deserialize, Serialize};

use crate::grouping::{group_by_tag, TagEntry};
use crate::merge::{merge, MergeOptions, TagAccumulator, TagGroup};
use crate::model::{PageResult, ResourceRecord, SearchCount};
use crate::ordered::OrderedMap;

/// Page size used when the orchestrator does not ask for one.
pub const DEFAULT_MAX_RESULTS: i32 = 10;

/// Input of the Search step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchStepInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl SearchStepInput {
    pub fn page_size(&self) -> i32 {
        self.max_results.unwrap_or(DEFAULT_MAX_RESULTS)
    }
}

/// Output of the Search step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchStepOutput {
    pub view_arn: String,
    #[serde(default)]
    pub count: SearchCount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
}

impl SearchStepOutput {
    pub fn from_page(view_arn: impl Into<String>, page: PageResult) -> Self {
        SearchStepOutput {
            view_arn: view_arn.into(),
            count: page.count,
            next_token: page.next_token,
            resources: page.resources,
        }
    }

    /// Group this page's resources into the shape the Merge step reads.
    pub fn grouped(&self) -> GroupedResults {
        GroupedResults {
            flatten: group_by_tag(&self.resources),
        }
    }
}

/// The `Results` block of the Merge step input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedResults {
    #[serde(default)]
    pub flatten: Vec<TagEntry>,
}

/// Accumulator carried between iterations.
///
/// The Merge step writes the flat form; the nested
/// `{tagName: {tagValue: [..]}}` form is also accepted so a checkpoint
/// captured from the raw grouping can seed a run. Both forms are folded in
/// document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreviousResults {
    Flat(Vec<TagGroup>),
    Nested(OrderedMap<OrderedMap<Vec<ResourceRecord>>>),
}

impl PreviousResults {
    pub fn into_accumulator(self) -> TagAccumulator {
        match self {
            PreviousResults::Flat(groups) => TagAccumulator::from_groups(groups),
            PreviousResults::Nested(nested) => {
                let mut acc = TagAccumulator::new();
                for (name, values) in nested {
                    for (value, resources) in values {
                        acc.merge_entry(
                            TagEntry::new(name.clone(), value, resources),
                            MergeOptions::default(),
                        );
                    }
                }
                acc
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PayloadResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// Task-result envelope some orchestrators wrap the previous step in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PayloadEnvelope {
    #[serde(default)]
    pub result: Option<PayloadResult>,
}

/// Input of the Merge step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MergeStepInput {
    #[serde(default)]
    pub results: GroupedResults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_results: Option<PreviousResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<PayloadEnvelope>,
}

impl MergeStepInput {
    /// Continuation token of the page being merged. A top-level `NextToken`
    /// wins over one nested in `Payload.Result`.
    pub fn next_token(&self) -> Option<&str> {
        self.next_token.as_deref().or_else(|| {
            self.payload
                .as_ref()
                .and_then(|p| p.result.as_ref())
                .and_then(|r| r.next_token.as_deref())
        })
    }
}

/// Output of the Merge step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MergeStepOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(default)]
    pub results: Vec<TagGroup>,
}

impl MergeStepOutput {
    pub fn has_more(&self) -> bool {
        self.next_token.is_some()
    }
}

/// Run the Merge step: seed from `PreviousResults`, fold in the page, flatten.
pub fn run_merge_step(input: MergeStepInput, options: MergeOptions) -> MergeStepOutput {
    let next_token = input.next_token().map(str::to_owned);
    let previous = input
        .previous_results
        .map(PreviousResults::into_accumulator)
        .unwrap_or_default();
    let merged = merge(previous, input.results.flatten, options);
    MergeStepOutput {
        next_token,
        results: merged.into_groups(),
    }
}
