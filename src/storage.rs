//! Artifact content store.
//!
//! A directory the pipeline writes export artifacts into. Names are
//! sanitized before touching the filesystem; callers get back stable paths
//! and no overwrite protection is provided.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const FALLBACK_NAME: &str = "document";

#[derive(Debug, Clone)]
pub struct ArtifactStorage {
    root: PathBuf,
}

impl ArtifactStorage {
    /// Open (and create if needed) the artifact directory.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a named artifact with the given extension. `name` is
    /// sanitized; an empty result falls back to a generic name.
    pub fn artifact_path(&self, name: &str, extension: &str) -> PathBuf {
        let mut safe = sanitize_filename::sanitize(name);
        if safe.is_empty() {
            safe = FALLBACK_NAME.to_string();
        }
        self.root.join(format!("{safe}.{extension}"))
    }
}
