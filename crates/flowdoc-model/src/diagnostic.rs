//! Structured diagnostics.
//!
//! Stages return a [`Diagnostic`] tree instead of pushing into a shared
//! collector. The caller merges child diagnostics and decides whether the
//! aggregated [`Severity`] aborts the run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Diagnostic severity, ordered from least to most severe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Ok,
    Info,
    Warning,
    Error,
    Fail,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "OK",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Fail => "FAIL",
        };
        f.write_str(s)
    }
}

/// A diagnostic message with optional source and nested children.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Element the diagnostic refers to (node id, path, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Diagnostic>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            source: None,
            children: Vec::new(),
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(Severity::Ok, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn push(&mut self, child: Diagnostic) {
        self.children.push(child);
    }

    /// Most severe severity of this diagnostic and all of its descendants.
    #[must_use]
    pub fn status(&self) -> Severity {
        self.children
            .iter()
            .map(Diagnostic::status)
            .fold(self.severity, Ord::max)
    }

    /// True if the aggregated status is [`Severity::Error`] or worse.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status() >= Severity::Error
    }

    /// Write the diagnostic tree, skipping subtrees below `min` severity.
    pub fn dump(&self, out: &mut impl fmt::Write, indent: usize, min: Severity) -> fmt::Result {
        if self.status() < min {
            return Ok(());
        }
        write!(out, "{:width$}[{}] {}", "", self.status(), self.message, width = indent * 2)?;
        if let Some(source) = &self.source {
            write!(out, " ({source})")?;
        }
        writeln!(out)?;
        for child in &self.children {
            child.dump(out, indent + 1, min)?;
        }
        Ok(())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(f, 0, Severity::Ok)
    }
}
