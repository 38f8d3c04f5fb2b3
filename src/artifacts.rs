//! Evidence capture: screenshot + serialized page content on disk.
//!
//! Filenames are `{timestamp}_{target}.png|html`. The directory is
//! append-only; nothing evicts old captures.

use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};

/// Local artifact directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create artifact dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one screenshot/HTML pair for `target_name` and return both paths.
    pub fn save(&self, target_name: &str, png: &[u8], html: &str) -> Result<(PathBuf, PathBuf)> {
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let png_path = self.dir.join(format!("{stamp}_{target_name}.png"));
        let html_path = self.dir.join(format!("{stamp}_{target_name}.html"));

        std::fs::write(&png_path, png)
            .with_context(|| format!("failed to write {}", png_path.display()))?;
        std::fs::write(&html_path, html)
            .with_context(|| format!("failed to write {}", html_path.display()))?;

        Ok((png_path, html_path))
    }
}
