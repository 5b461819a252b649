//! Container manifest.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use flowdoc_model::Diagnostic;
use serde::{Deserialize, Serialize};

use crate::SiteError;

/// Where the bytes of a manifest entry come from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntrySource {
    /// A file in the staging area.
    Staged { path: PathBuf },
    /// Bytes held by the entry itself.
    Inline { text: String },
}

/// One file of the generated site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Human-readable description of the resource.
    pub description: String,
    /// Target location inside the container, `/`-separated.
    pub location: String,
    pub source: EntrySource,
}

impl ManifestEntry {
    /// Read the bytes of the entry.
    pub fn read(&self) -> Result<Vec<u8>, SiteError> {
        match &self.source {
            EntrySource::Staged { path } => fs::read(path).map_err(SiteError::io(path)),
            EntrySource::Inline { text } => Ok(text.clone().into_bytes()),
        }
    }
}

/// Ordered list of files making up a generated site.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Container name; every location starts with `<name>/`.
    pub name: String,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Append an entry at `<name>/<location>`.
    pub fn push(&mut self, description: impl Into<String>, location: &str, source: EntrySource) {
        self.entries.push(ManifestEntry {
            description: description.into(),
            location: format!("{}/{}", self.name, location.trim_start_matches('/')),
            source,
        });
    }

    /// Check target locations and sources.
    ///
    /// Empty, absolute, escaping and duplicate locations are errors, as are
    /// staged sources that do not exist.
    #[must_use]
    pub fn validate(&self) -> Diagnostic {
        let mut result = Diagnostic::ok(format!("Manifest {}", self.name));
        let mut seen: HashMap<&str, &str> = HashMap::new();

        for entry in &self.entries {
            let location = entry.location.as_str();
            if location.is_empty() || location.ends_with('/') {
                result.push(
                    Diagnostic::error("Entry has no target location").with_source(&entry.description),
                );
                continue;
            }
            if location.starts_with('/') || location.split('/').any(|s| s == "..") {
                result.push(
                    Diagnostic::error(format!("Location {location} escapes the container"))
                        .with_source(&entry.description),
                );
            }
            if let Some(first) = seen.insert(location, entry.description.as_str()) {
                result.push(
                    Diagnostic::error(format!("Location {location} is already used by {first}"))
                        .with_source(&entry.description),
                );
            }
            if let EntrySource::Staged { path } = &entry.source
                && !path.is_file()
            {
                result.push(
                    Diagnostic::error(format!("Source {} does not exist", path.display()))
                        .with_source(&entry.description),
                );
            }
        }

        result
    }

    /// Persist the manifest as JSON.
    pub fn save(&self, path: &Path) -> Result<(), SiteError> {
        let json = serde_json::to_vec_pretty(self).map_err(|source| SiteError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(SiteError::io(path))
    }

    pub fn load(path: &Path) -> Result<Self, SiteError> {
        let bytes = fs::read(path).map_err(SiteError::io(path))?;
        serde_json::from_slice(&bytes).map_err(|source| SiteError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
