//! Grouping of one search page by tag pair.
//!
//! The orchestrator exchanges groupings in a nested single-key shape:
//!
//! ```json
//! [{"env": {"prod": [ {"Arn": "...", ...} ]}}, {"NoTag": {"NoValue": [ ... ]}}]
//! ```
//!
//! [`TagEntry`] is the typed form of one such element. Its serde impls keep the
//! wire shape and reject anything that is not exactly one tag name holding
//! exactly one tag value.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::model::ResourceRecord;

/// One `(tag name, tag value) -> resources` grouping from a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub tag_name: String,
    pub tag_value: String,
    pub resources: Vec<ResourceRecord>,
}

impl TagEntry {
    pub fn new(
        tag_name: impl Into<String>,
        tag_value: impl Into<String>,
        resources: Vec<ResourceRecord>,
    ) -> Self {
        TagEntry {
            tag_name: tag_name.into(),
            tag_value: tag_value.into(),
            resources,
        }
    }
}

impl Serialize for TagEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut inner = BTreeMap::new();
        inner.insert(self.tag_value.as_str(), &self.resources);
        let mut outer = BTreeMap::new();
        outer.insert(self.tag_name.as_str(), inner);
        outer.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TagEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let outer: BTreeMap<String, BTreeMap<String, Vec<ResourceRecord>>> =
            BTreeMap::deserialize(deserializer)?;
        let mut outer = outer.into_iter();
        let (tag_name, inner) = match (outer.next(), outer.next()) {
            (Some(pair), None) => pair,
            _ => {
                return Err(de::Error::custom(ShapeError(
                    "expected exactly one tag name per grouping entry",
                )))
            }
        };
        let mut inner = inner.into_iter();
        let (tag_value, resources) = match (inner.next(), inner.next()) {
            (Some(pair), None) => pair,
            _ => {
                return Err(de::Error::custom(ShapeError(
                    "expected exactly one tag value under the tag name",
                )))
            }
        };
        Ok(TagEntry {
            tag_name,
            tag_value,
            resources,
        })
    }
}

struct ShapeError(&'static str);

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed tag grouping: {}", self.0)
    }
}

/// Group a page of resources by every tag pair they carry.
///
/// A resource with `n` tags lands in `n` entries; an untagged resource lands
/// in the `("NoTag", "NoValue")` entry. Entries come out in the order their
/// pair was first seen, resources within an entry in page order.
pub fn group_by_tag(resources: &[ResourceRecord]) -> Vec<TagEntry> {
    let mut entries: Vec<TagEntry> = Vec::new();
    let mut positions: HashMap<(String, String), usize> = HashMap::new();

    for resource in resources {
        for tag in resource.effective_tags() {
            let key = (tag.key, tag.value);
            match positions.get(&key) {
                Some(&idx) => entries[idx].resources.push(resource.clone()),
                None => {
                    positions.insert(key.clone(), entries.len());
                    entries.push(TagEntry::new(key.0, key.1, vec![resource.clone()]));
                }
            }
        }
    }

    entries
}
