//! Widget artifact sink.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::write_atomically;
use crate::common::utils::private_path;
use crate::prayer::payload::PrayerResponse;

/// Writes the latest response to one well-known JSON file.
///
/// Each write replaces the whole file; there is no history.
#[derive(Debug, Clone)]
pub struct ArtifactSink {
    path: PathBuf,
}

impl ArtifactSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, response: &PrayerResponse) -> Result<()> {
        let bytes = serde_json::to_vec(response).context("Failed to serialize widget data")?;
        write_atomically(&self.path, &bytes)?;
        log_debug!(
            "Widget data written to {} ({} bytes)",
            private_path(&self.path),
            bytes.len()
        );
        Ok(())
    }

    /// The last response written, or `None` before the first write.
    pub fn read(&self) -> Result<Option<PrayerResponse>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", private_path(&self.path)))?;
        let response = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", private_path(&self.path)))?;
        Ok(Some(response))
    }
}
