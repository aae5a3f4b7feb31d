//! The result merger.
//!
//! Folds one page of [`TagEntry`] groupings into the run's accumulator. Rules,
//! applied entry by entry:
//!
//! 1. tag name and tag value both already present: the page's resources are
//!    appended after the accumulated ones.
//! 2. tag name present, tag value new: the value is added under that name.
//! 3. tag name new: the whole entry is inserted.
//!
//! Appending does not deduplicate by default. If the index re-emits a
//! resource on two pages of the same run it is counted twice downstream.
//! [`MergeOptions::dedup_by_arn`] switches on per-group dedup for deployments
//! that cannot tolerate that.
//!
//! Precondition for callers: a page must be merged at most once. Re-running a
//! merge with the same page after a crash double-counts it; orchestrators
//! retry the search, never an already-merged page.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::grouping::TagEntry;
use crate::model::ResourceRecord;

/// Flattened accumulator record handed back to the orchestrator and written
/// as the run's final output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TagGroup {
    pub tag_name: String,
    pub tag_value: String,
    pub resources: Vec<ResourceRecord>,
}

/// Knobs for [`merge()`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Skip resources whose ARN is already present in the target group.
    #[serde(default)]
    pub dedup_by_arn: bool,
}

#[derive(Debug, Clone, Default)]
struct ValueGroups {
    order: Vec<String>,
    resources: HashMap<String, Vec<ResourceRecord>>,
}

impl PartialEq for ValueGroups {
    fn eq(&self, other: &Self) -> bool {
        self.resources == other.resources
    }
}

impl Eq for ValueGroups {}

/// Accumulated `tag name -> tag value -> resources` groups for one run.
///
/// Iteration follows insertion order of tag names, then of values within a
/// name. Equality ignores that order: two accumulators are equal when they
/// hold the same resources under the same pairs.
#[derive(Debug, Clone, Default)]
pub struct TagAccumulator {
    order: Vec<String>,
    groups: HashMap<String, ValueGroups>,
}

impl PartialEq for TagAccumulator {
    fn eq(&self, other: &Self) -> bool {
        self.groups == other.groups
    }
}

impl Eq for TagAccumulator {}

impl TagAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an accumulator from previously flattened results, e.g. the
    /// `PreviousResults` an orchestrator carries between iterations.
    pub fn from_groups(groups: Vec<TagGroup>) -> Self {
        let mut acc = TagAccumulator::new();
        for group in groups {
            acc.merge_entry(
                TagEntry::new(group.tag_name, group.tag_value, group.resources),
                MergeOptions::default(),
            );
        }
        acc
    }

    /// Merge a single page entry according to the module-level rules.
    pub fn merge_entry(&mut self, entry: TagEntry, options: MergeOptions) {
        let TagEntry {
            tag_name,
            tag_value,
            resources,
        } = entry;

        if !self.groups.contains_key(&tag_name) {
            self.order.push(tag_name.clone());
        }
        let values = self.groups.entry(tag_name).or_default();

        match values.resources.get_mut(&tag_value) {
            Some(existing) => append(existing, resources, options),
            None => {
                let mut fresh = Vec::with_capacity(resources.len());
                append(&mut fresh, resources, options);
                values.order.push(tag_value.clone());
                values.resources.insert(tag_value, fresh);
            }
        }
    }

    /// Resources accumulated under `(tag_name, tag_value)`.
    pub fn get(&self, tag_name: &str, tag_value: &str) -> Option<&[ResourceRecord]> {
        self.groups
            .get(tag_name)
            .and_then(|v| v.resources.get(tag_value))
            .map(Vec::as_slice)
    }

    /// Tag names in insertion order.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of distinct `(tag name, tag value)` pairs.
    pub fn len(&self) -> usize {
        self.groups.values().map(|v| v.order.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total resource references across all groups (a resource with three
    /// tags counts three times).
    pub fn resource_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(|v| v.resources.values())
            .map(Vec::len)
            .sum()
    }

    /// One [`TagGroup`] per `(tag name, tag value)` pair, in insertion order.
    pub fn flatten(&self) -> Vec<TagGroup> {
        let mut out = Vec::with_capacity(self.len());
        for name in &self.order {
            let Some(values) = self.groups.get(name) else {
                continue;
            };
            for value in &values.order {
                if let Some(resources) = values.resources.get(value) {
                    out.push(TagGroup {
                        tag_name: name.clone(),
                        tag_value: value.clone(),
                        resources: resources.clone(),
                    });
                }
            }
        }
        out
    }

    /// Consuming variant of [`flatten`](Self::flatten).
    pub fn into_groups(mut self) -> Vec<TagGroup> {
        let mut out = Vec::new();
        for name in self.order {
            let Some(mut values) = self.groups.remove(&name) else {
                continue;
            };
            for value in values.order {
                if let Some(resources) = values.resources.remove(&value) {
                    out.push(TagGroup {
                        tag_name: name.clone(),
                        tag_value: value,
                        resources,
                    });
                }
            }
        }
        out
    }
}

fn append(target: &mut Vec<ResourceRecord>, incoming: Vec<ResourceRecord>, options: MergeOptions) {
    if !options.dedup_by_arn {
        target.extend(incoming);
        return;
    }
    let mut seen: HashSet<String> = target.iter().map(|r| r.arn.clone()).collect();
    for resource in incoming {
        if seen.insert(resource.arn.clone()) {
            target.push(resource);
        }
    }
}

/// Fold a page of entries into `previous` and return the updated accumulator.
pub fn merge(
    previous: TagAccumulator,
    entries: Vec<TagEntry>,
    options: MergeOptions,
) -> TagAccumulator {
    let mut acc = previous;
    for entry in entries {
        acc.merge_entry(entry, options);
    }
    acc
}
