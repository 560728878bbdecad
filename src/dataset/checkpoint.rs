//! Checkpoint sidecar written after every persisted batch.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Load state represented by the dataset on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Successful load-more clicks needed to reach the persisted rows
    pub clicks: usize,
    /// Rows in the dataset when the checkpoint was written
    pub rows: usize,
    /// Model text of the last persisted row
    #[serde(default)]
    pub last_model: Option<String>,
}

impl Checkpoint {
    /// Loads a checkpoint, returning `None` if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read checkpoint: {}", path.display()))?;
        let checkpoint = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse checkpoint: {}", path.display()))?;
        Ok(Some(checkpoint))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        debug!("Saving checkpoint to {}: {:?}", path.display(), self);

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write checkpoint: {}", path.display()))
    }
}
