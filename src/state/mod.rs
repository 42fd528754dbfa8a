//! Persistent user state kept outside the TOML configuration.
//!
//! Two collaborators live here:
//!
//! - [`SettingsStore`]: a key-value store of JSON values holding the user's
//!   calculation and recitation preferences. Missing keys are normal on a
//!   first run and resolve to the documented defaults.
//! - [`ArtifactSink`]: the single widget file the latest
//!   [`PrayerResponse`](crate::prayer::PrayerResponse) is written to for a
//!   home-screen widget or background refresher to pick up.
//!
//! Both replace whole files atomically (temp file plus rename), so a reader
//! never observes a half-written document.

pub mod artifact;
pub mod settings;
pub mod store;

pub use artifact::ArtifactSink;
pub use settings::{QuranSettings, SalahSettings};
pub use store::{JsonFileSettingsStore, MemorySettingsStore, SettingsStore};

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::common::utils::private_path;

/// Replace `path` with `contents` via a temp file in the same directory.
///
/// The rename is atomic on the same filesystem, which is why the temp file
/// is created next to the target rather than in the system temp dir.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory {}", private_path(parent)))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", private_path(parent)))?;
    temp.write_all(contents).context("Failed to write temp file")?;
    temp.as_file().sync_all().context("Failed to sync temp file")?;
    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", private_path(path)))?;
    Ok(())
}

#[cfg(test)]
mod tests;
