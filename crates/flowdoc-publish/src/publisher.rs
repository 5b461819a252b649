//! Copying a generated site into the publish directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use flowdoc_model::{Cancelled, Deadline};

use crate::PathPatterns;
use crate::walk::relative;

/// Error from cleaning or copying the publish directory.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Target {} is inside source {}", target.display(), source_dir.display())]
    Overlap { source_dir: PathBuf, target: PathBuf },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl PublishError {
    fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// Counts from one publish run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub deleted: usize,
    pub copied: usize,
}

/// Publishes generated files, sparing files matched by a keep list.
#[derive(Clone, Debug, Default)]
pub struct Publisher {
    keep: PathPatterns,
    deadline: Deadline,
}

impl Publisher {
    #[must_use]
    pub fn new(keep: PathPatterns) -> Self {
        Self {
            keep,
            deadline: Deadline::none(),
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Delete everything under `target` that the keep list does not match.
    ///
    /// Walks depth-first. A directory is removed only when it is not kept
    /// itself and is empty once its children are processed, so directories
    /// holding kept files survive. Symbolic links count as files, so nothing
    /// outside `target` is touched. A missing `target` is not an error.
    pub fn clean(&self, target: &Path) -> Result<usize, PublishError> {
        if !target.is_dir() {
            return Ok(0);
        }
        let mut deleted = 0;
        self.clean_dir(target, target, &mut deleted)?;
        tracing::debug!(target = %target.display(), deleted, "Cleaned publish directory");
        Ok(deleted)
    }

    fn clean_dir(&self, base: &Path, dir: &Path, deleted: &mut usize) -> Result<(), PublishError> {
        for entry in fs::read_dir(dir).map_err(PublishError::io(dir))? {
            self.deadline.check("clean")?;
            let entry = entry.map_err(PublishError::io(dir))?;
            let path = entry.path();
            let rel = relative(base, &path);
            // Symlinks are removed as links, never followed.
            let file_type = entry.file_type().map_err(PublishError::io(&path))?;

            if file_type.is_dir() {
                self.clean_dir(base, &path, deleted)?;
                let empty = fs::read_dir(&path)
                    .map_err(PublishError::io(&path))?
                    .next()
                    .is_none();
                if empty && !self.keep.matches(&rel) {
                    fs::remove_dir(&path).map_err(PublishError::io(&path))?;
                    *deleted += 1;
                }
            } else if !self.keep.matches(&rel) {
                fs::remove_file(&path).map_err(PublishError::io(&path))?;
                *deleted += 1;
            }
        }
        Ok(())
    }

    /// Copy `source` into `target` recursively, overwriting existing files.
    ///
    /// `listener` is called with the relative path and the written file after
    /// every successful copy.
    pub fn copy(
        &self,
        source: &Path,
        target: &Path,
        listener: &mut dyn FnMut(&str, &Path),
    ) -> Result<usize, PublishError> {
        if !source.is_dir() {
            return Err(PublishError::SourceNotFound(source.to_path_buf()));
        }
        let mut copied = 0;
        self.copy_dir(source, source, target, listener, &mut copied)?;
        Ok(copied)
    }

    fn copy_dir(
        &self,
        base: &Path,
        dir: &Path,
        target: &Path,
        listener: &mut dyn FnMut(&str, &Path),
        copied: &mut usize,
    ) -> Result<(), PublishError> {
        fs::create_dir_all(target).map_err(PublishError::io(target))?;
        for entry in fs::read_dir(dir).map_err(PublishError::io(dir))? {
            self.deadline.check("copy")?;
            let entry = entry.map_err(PublishError::io(dir))?;
            let path = entry.path();
            let dest = target.join(entry.file_name());

            if path.is_dir() {
                self.copy_dir(base, &path, &dest, listener, copied)?;
            } else {
                fs::copy(&path, &dest).map_err(PublishError::io(&dest))?;
                *copied += 1;
                listener(&relative(base, &path), &dest);
            }
        }
        Ok(())
    }

    /// Clean `target`, then copy `source` into it.
    ///
    /// Running twice over unchanged input leaves `target` unchanged apart
    /// from file times.
    pub fn publish(&self, source: &Path, target: &Path) -> Result<PublishSummary, PublishError> {
        self.publish_with(source, target, &mut |_, _| {})
    }

    /// [`publish`](Self::publish) with a per-file copy listener.
    pub fn publish_with(
        &self,
        source: &Path,
        target: &Path,
        listener: &mut dyn FnMut(&str, &Path),
    ) -> Result<PublishSummary, PublishError> {
        if !source.is_dir() {
            return Err(PublishError::SourceNotFound(source.to_path_buf()));
        }
        if target.starts_with(source) {
            return Err(PublishError::Overlap {
                source_dir: source.to_path_buf(),
                target: target.to_path_buf(),
            });
        }

        let deleted = self.clean(target)?;
        let copied = self.copy(source, target, listener)?;
        tracing::info!(
            source = %source.display(),
            target = %target.display(),
            deleted,
            copied,
            "Published site"
        );
        Ok(PublishSummary { deleted, copied })
    }
}
