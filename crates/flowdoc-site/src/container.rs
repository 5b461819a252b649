//! Byte-addressable output containers.

use std::fs;
use std::path::{Path, PathBuf};

use flowdoc_model::Deadline;

use crate::{Manifest, SiteError};

/// Destination the manifest is materialized into.
///
/// Paths are `/`-separated and relative to the container root.
pub trait Container: Send + Sync {
    /// Write `bytes` at `path`, replacing existing content.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be stored.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), SiteError>;
}

/// Container backed by a local directory.
#[derive(Clone, Debug)]
pub struct FsContainer {
    root: PathBuf,
}

impl FsContainer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Container for FsContainer {
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), SiteError> {
        let target = path
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |dir, segment| dir.join(segment));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(SiteError::io(parent))?;
        }
        fs::write(&target, bytes).map_err(SiteError::io(&target))?;
        tracing::debug!(path = %path, "Materialized");
        Ok(())
    }
}

/// Validate `manifest` and write every entry into `container`.
///
/// Nothing is written unless validation passes. Returns the number of
/// written entries.
///
/// # Errors
///
/// Returns [`SiteError::InvalidManifest`] if validation reports errors, or the
/// first read/write failure.
pub fn materialize(
    manifest: &Manifest,
    container: &dyn Container,
    deadline: Deadline,
) -> Result<usize, SiteError> {
    let diagnostic = manifest.validate();
    if diagnostic.is_error() {
        return Err(SiteError::InvalidManifest(diagnostic));
    }

    for entry in &manifest.entries {
        deadline.check("materialize")?;
        container.write(&entry.location, &entry.read()?)?;
    }

    tracing::info!(
        name = %manifest.name,
        entries = manifest.entries.len(),
        "Materialized container"
    );
    Ok(manifest.entries.len())
}
