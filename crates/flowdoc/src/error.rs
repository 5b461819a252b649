//! CLI error types.

use flowdoc_config::ConfigError;
use flowdoc_model::{Diagnostic, ModelError};
use flowdoc_publish::{IndexError, PublishError};
use flowdoc_site::SiteError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("{0}")]
    Site(#[from] SiteError),

    #[error("{0}")]
    Publish(#[from] PublishError),

    #[error("{0}")]
    Index(#[from] IndexError),

    #[error("Invalid path pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl CliError {
    /// Diagnostic to print before the error, with its banner title.
    pub(crate) fn diagnostic(&self) -> Option<(&str, &Diagnostic)> {
        match self {
            Self::Model(ModelError::Validation(diagnostic))
            | Self::Site(SiteError::Model(ModelError::Validation(diagnostic))) => {
                Some(("Action tree validation", diagnostic))
            }
            Self::Site(SiteError::InvalidManifest(diagnostic)) => Some(("Manifest validation", diagnostic)),
            Self::Site(SiteError::Diagnostic { step, diagnostic }) => Some((step.as_str(), diagnostic)),
            _ => None,
        }
    }
}
