//! The rooted action tree.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{ActionNode, Diagnostic};

/// Location token replaced with the relative path to the site root.
pub const BASE_URI: &str = "${base-uri}";

/// Errors from loading or validating the model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid page file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model validation failed:\n{0}")]
    Validation(Diagnostic),
}

/// An action hierarchy with exactly one root.
///
/// Construction assigns a UUID to every node without an identifier, so ids are
/// always non-empty. Uniqueness is checked by [`ActionTree::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionTree {
    root: ActionNode,
}

impl ActionTree {
    pub fn new(mut root: ActionNode) -> Self {
        assign_ids(&mut root);
        Self { root }
    }

    /// Load a tree from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        Ok(Self::new(Self::load_node(path)?))
    }

    /// Load a single node (with its descendants) from a YAML file.
    pub fn load_node(path: &Path) -> Result<ActionNode, ModelError> {
        let text = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let node = serde_yaml::from_str(&text).map_err(|source| ModelError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded actions");
        Ok(node)
    }

    /// Parse a tree from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ModelError> {
        serde_yaml::from_str(yaml)
            .map(Self::new)
            .map_err(|source| ModelError::Yaml {
                path: PathBuf::from("<string>"),
                source,
            })
    }

    #[must_use]
    pub fn root(&self) -> &ActionNode {
        &self.root
    }

    #[must_use]
    pub fn into_root(self) -> ActionNode {
        self.root
    }

    /// Append a node as the last child of the root.
    pub fn append_child(&mut self, mut node: ActionNode) {
        assign_ids(&mut node);
        self.root.children.push(node);
    }

    /// Make the first child of the root the site's index page.
    ///
    /// A child that declares its own location keeps it.
    pub fn set_home(&mut self) {
        if let Some(first) = self.root.children.first_mut()
            && first.location.is_none()
        {
            first.location = Some(format!("{BASE_URI}index.html"));
        }
    }

    /// Find a node by identifier.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ActionNode> {
        self.root.walk().into_iter().map(|r| r.node).find(|n| n.id == id)
    }

    /// Check identifier uniqueness, text and explicit locations.
    #[must_use]
    pub fn validate(&self) -> Diagnostic {
        let mut result = Diagnostic::ok("Action tree validation");
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for r in self.root.walk() {
            let node = r.node;
            *seen.entry(node.id.as_str()).or_default() += 1;

            if node.text.trim().is_empty() {
                result.push(Diagnostic::error("Action has no text").with_source(&node.id));
            }
            if let Some(location) = &node.location
                && location.trim_start_matches(BASE_URI).trim().is_empty()
            {
                result.push(Diagnostic::error("Explicit location is empty").with_source(&node.id));
            }
            if !node.is_page() && node.content.is_some() {
                result.push(
                    Diagnostic::warning("Container content is never rendered").with_source(&node.id),
                );
            }
        }

        let mut duplicates: Vec<_> = seen.into_iter().filter(|(_, n)| *n > 1).collect();
        duplicates.sort_unstable();
        for (id, count) in duplicates {
            result.push(
                Diagnostic::error(format!("Identifier is used by {count} actions")).with_source(id),
            );
        }

        result
    }

    /// Validate and fail with [`ModelError::Validation`] on errors.
    pub fn ensure_valid(&self) -> Result<(), ModelError> {
        let diagnostic = self.validate();
        if diagnostic.is_error() {
            return Err(ModelError::Validation(diagnostic));
        }
        Ok(())
    }
}

fn assign_ids(root: &mut ActionNode) {
    root.for_each_mut(&mut |node| {
        if node.id.is_empty() {
            node.id = uuid::Uuid::new_v4().to_string();
        }
    });
}
