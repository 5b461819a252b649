//! Staging area for generated content and pages.

use std::fs;
use std::path::{Path, PathBuf};

use flowdoc_model::ContentReference;

use crate::SiteError;

/// Intermediate on-disk location for rendered content and persisted pages.
///
/// ```text
/// <root>/content/<action-id>.html   rendered action content
/// <root>/pages/<page-id>.json       persisted page
/// <root>/pages/<page-id>.html       rendered page
/// ```
#[derive(Clone, Debug)]
pub struct Staging {
    root: PathBuf,
}

impl Staging {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn content_dir(&self) -> PathBuf {
        self.root.join("content")
    }

    #[must_use]
    pub fn pages_dir(&self) -> PathBuf {
        self.root.join("pages")
    }

    /// Remove output of a previous run and create empty staging directories.
    pub fn prepare(&self) -> Result<(), SiteError> {
        for dir in [self.content_dir(), self.pages_dir()] {
            if dir.exists() {
                fs::remove_dir_all(&dir).map_err(SiteError::io(&dir))?;
            }
            fs::create_dir_all(&dir).map_err(SiteError::io(&dir))?;
        }
        Ok(())
    }

    /// Write rendered content of an action.
    ///
    /// The returned reference is relative to the pages directory, where the
    /// persisted pages that use it live.
    pub fn write_content(&self, id: &str, bytes: &[u8]) -> Result<ContentReference, SiteError> {
        let file_name = format!("{id}.html");
        let path = self.content_dir().join(&file_name);
        fs::write(&path, bytes).map_err(SiteError::io(&path))?;
        tracing::debug!(action = %id, path = %path.display(), "Staged content");
        Ok(ContentReference::new(format!("../content/{file_name}")))
    }
}
