//! Checkpoints persisted to a local JSON file.

use std::io::Write;
use std::path::{Path, PathBuf};

use tag_inventory_aggregate::{Checkpoint, CheckpointError, CheckpointSink};
use tempfile::NamedTempFile;

/// Keeps the latest checkpoint in one file. Each save replaces the file
/// atomically, so a crash leaves either the old or the new checkpoint.
#[derive(Debug, Clone)]
pub(crate) struct FileCheckpoints {
    path: PathBuf,
}

impl FileCheckpoints {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCheckpoints { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Checkpoint, CheckpointError> {
        let text = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl CheckpointSink for FileCheckpoints {
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, checkpoint)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tag_inventory_core::{RunDate, TagGroup};

    fn checkpoint(pages: usize, token: Option<&str>) -> Checkpoint {
        Checkpoint {
            run_id: "run-1".into(),
            date: "2024-03-15".parse::<RunDate>().unwrap(),
            next_token: token.map(str::to_string),
            results: vec![TagGroup {
                tag_name: "env".into(),
                tag_value: "prod".into(),
                resources: Vec::new(),
            }],
            pages_consumed: pages,
        }
    }

    #[test]
    fn save_then_load_returns_latest() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileCheckpoints::new(dir.path().join("run.json"));

        sink.save(&checkpoint(1, Some("page-2"))).unwrap();
        sink.save(&checkpoint(2, None)).unwrap();

        let loaded = sink.load().unwrap();
        assert_eq!(loaded, checkpoint(2, None));
        assert!(loaded.is_exhausted());
        // Only the checkpoint itself is left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileCheckpoints::new(dir.path().join("absent.json"));
        assert!(matches!(sink.load(), Err(CheckpointError::Io(_))));
    }

    #[test]
    fn garbage_is_an_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileCheckpoints::new(path).load(),
            Err(CheckpointError::Encode(_))
        ));
    }
}
