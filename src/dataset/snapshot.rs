//! Snapshot storage logic
//!
//! Keeps the most recently uploaded dataset on disk so the schema step can
//! pick it up without re-reading the source file. There is a single
//! snapshot location; every upload replaces the previous one.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::dataset::types::ColumnarDataset;
use crate::error::{PipelineError, Result};

/// Current snapshot envelope version
pub const SNAPSHOT_VERSION: u32 = 2;

/// A persisted dataset together with where it came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Envelope version for migrations
    pub version: u32,
    /// Path of the file the dataset was parsed from
    pub source_file: String,
    /// SHA256 of the source bytes
    pub content_hash: String,
    /// RFC 3339 timestamp of the upload
    pub created_at: String,
    pub dataset: ColumnarDataset,
}

/// Fixed-location store for the upload snapshot
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Saves a snapshot using a temp file + rename so readers never observe
    /// a partially written file.
    pub fn save(&self, source: &Path, content: &[u8], dataset: &ColumnarDataset) -> Result<()> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            source_file: source.display().to_string(),
            content_hash: content_hash(content),
            created_at: chrono::Utc::now().to_rfc3339(),
            dataset: dataset.clone(),
        };

        let bytes = bincode::serialize(&snapshot).map_err(|e| PipelineError::Snapshot {
            message: format!("Failed to serialize dataset snapshot: {}", e),
        })?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let mut file = NamedTempFile::new_in(parent)?;
        file.write_all(&bytes)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| PipelineError::Snapshot {
            message: format!(
                "Failed to move snapshot into place at {}: {}",
                self.path.display(),
                e.error
            ),
        })?;

        tracing::debug!("Wrote dataset snapshot to {}", self.path.display());
        Ok(())
    }

    /// Removes the snapshot, if any, so a failed upload cannot leave an
    /// older dataset behind for the next submission.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Removed dataset snapshot {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads the last saved snapshot.
    pub fn load(&self) -> Result<Snapshot> {
        if !self.exists() {
            return Err(PipelineError::Snapshot {
                message: "No uploaded dataset found. Upload a CSV file first.".to_string(),
            });
        }

        let bytes = std::fs::read(&self.path)?;
        let snapshot: Snapshot =
            bincode::deserialize(&bytes).map_err(|e| PipelineError::Snapshot {
                message: format!("Failed to decode dataset snapshot: {}", e),
            })?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PipelineError::Snapshot {
                message: format!(
                    "Unsupported snapshot version {} (expected {})",
                    snapshot.version, SNAPSHOT_VERSION
                ),
            });
        }

        if snapshot.dataset.is_empty() {
            return Err(PipelineError::Snapshot {
                message: "The uploaded dataset has no columns.".to_string(),
            });
        }

        Ok(snapshot)
    }
}

fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
