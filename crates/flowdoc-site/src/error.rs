use std::path::PathBuf;

use flowdoc_model::{Cancelled, Diagnostic, ModelError};
use flowdoc_nav::NavError;

/// Error returned by site assembly and materialization.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Nav(#[from] NavError),

    #[error("Invalid manifest file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The manifest failed validation; nothing was written.
    #[error("Manifest validation failed:\n{0}")]
    InvalidManifest(Diagnostic),

    /// A named step reported errors.
    #[error("{step} failed:\n{diagnostic}")]
    Diagnostic { step: String, diagnostic: Diagnostic },

    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error("Failed to start render workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SiteError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    /// Diagnostic attached to the error, if any.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::InvalidManifest(diagnostic)
            | Self::Diagnostic { diagnostic, .. }
            | Self::Model(ModelError::Validation(diagnostic)) => Some(diagnostic),
            _ => None,
        }
    }
}
