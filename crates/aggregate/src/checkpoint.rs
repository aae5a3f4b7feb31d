//! Durable progress of an aggregation run.
//!
//! After every merge the orchestrator hands a [`Checkpoint`] to its
//! [`CheckpointSink`]. The accumulator it carries is the only resumption
//! channel: a run restarted from a checkpoint continues from
//! `next_token` with `results` as `PreviousResults`.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tag_inventory_core::{RunDate, TagGroup};

use crate::error::CheckpointError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Checkpoint {
    pub run_id: String,
    pub date: RunDate,
    /// Token of the next page to fetch; `None` once the index is exhausted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    /// Flattened accumulator after the last merged page.
    #[serde(default)]
    pub results: Vec<TagGroup>,
    pub pages_consumed: usize,
}

impl Checkpoint {
    /// Every page has been merged; only the write and notify remain.
    pub fn is_exhausted(&self) -> bool {
        self.pages_consumed > 0 && self.next_token.is_none()
    }
}

/// Where checkpoints go.
pub trait CheckpointSink: Send + Sync {
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError>;
}

/// Discards every checkpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCheckpoints;

impl CheckpointSink for NoCheckpoints {
    fn save(&self, _checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        Ok(())
    }
}

/// Keeps every checkpoint in memory, oldest first.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpoints {
    saved: Arc<Mutex<Vec<Checkpoint>>>,
}

impl MemoryCheckpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<Checkpoint> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn latest(&self) -> Option<Checkpoint> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl CheckpointSink for MemoryCheckpoints {
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(checkpoint.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint(next_token: Option<&str>, pages: usize) -> Checkpoint {
        Checkpoint {
            run_id: "run-1".into(),
            date: "2024-01-02".parse().unwrap(),
            next_token: next_token.map(str::to_string),
            results: Vec::new(),
            pages_consumed: pages,
        }
    }

    #[test]
    fn exhausted_only_after_a_final_page() {
        assert!(!checkpoint(None, 0).is_exhausted());
        assert!(!checkpoint(Some("t"), 2).is_exhausted());
        assert!(checkpoint(None, 3).is_exhausted());
    }

    #[test]
    fn checkpoint_wire_form_is_pascal_case() {
        let value = serde_json::to_value(checkpoint(Some("page-2"), 1)).unwrap();
        assert_eq!(value["RunId"], "run-1");
        assert_eq!(value["Date"], "2024-01-02");
        assert_eq!(value["NextToken"], "page-2");
        assert_eq!(value["PagesConsumed"], 1);
    }

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemoryCheckpoints::new();
        sink.save(&checkpoint(Some("a"), 1)).unwrap();
        sink.save(&checkpoint(None, 2)).unwrap();
        assert_eq!(sink.saved().len(), 2);
        assert_eq!(sink.latest().unwrap().pages_consumed, 2);
    }
}
