//! tag-inventory-core: data model and pure aggregation logic.
//!
//! Everything in this crate is side-effect free. It defines the records the
//! resource index hands back, the nested tag-grouping wire shape exchanged
//! with the orchestrator, and the merge that folds one page of groupings into
//! the run's accumulator.
//!
//! # Public API
//!
//! - [`ResourceRecord`], [`Tag`], [`PageResult`] -- what a search page holds
//! - [`group_by_tag()`] -- page of resources to flattened tag entries
//! - [`TagAccumulator`] / [`merge()`] -- fold entries into the accumulator
//! - [`step`] -- the `PascalCase` payloads each orchestrated step reads and writes
//! - [`RunDate`] / [`OutputKey`] -- naming of per-run objects

pub mod error;
pub mod grouping;
pub mod merge;
pub mod model;
pub mod naming;
pub mod ordered;
pub mod step;

pub use error::CoreError;
pub use grouping::{group_by_tag, TagEntry};
pub use merge::{merge, MergeOptions, TagAccumulator, TagGroup};
pub use model::{
    PageResult, ResourceRecord, SearchCount, Tag, UNTAGGED_NAME, UNTAGGED_VALUE,
};
pub use naming::{report_object_key, OutputKey, RunDate};
pub use ordered::OrderedMap;
