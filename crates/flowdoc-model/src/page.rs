//! Pages, content references and the page template.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Relative location of a staged content file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentReference {
    pub location: String,
}

impl ContentReference {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Resolve the reference against the directory of the referring file.
    #[must_use]
    pub fn resolve(&self, dir: &Path) -> PathBuf {
        self.location
            .split('/')
            .fold(dir.to_path_buf(), |mut path, segment| {
                match segment {
                    "" | "." => {}
                    ".." => {
                        path.pop();
                    }
                    s => path.push(s),
                }
                path
            })
    }
}

impl fmt::Display for ContentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location)
    }
}

/// Breadcrumb entry linking to an ancestor page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub text: String,
    /// Location relative to the page, `None` for non-navigable ancestors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// An independently renderable page.
///
/// Pages are created during the first assembly pass with a fresh identifier,
/// persisted as `<id>.json` and converted to HTML in the second pass without
/// access to the action tree. Everything the second pass needs is therefore
/// carried here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNode {
    pub id: String,
    /// Identifier of the action the page was generated for.
    pub action_id: String,
    pub title: String,
    /// Site-relative output location, e.g. `guide/index.html`.
    pub location: String,
    /// Staged content, relative to the directory of the persisted page.
    pub content: Vec<ContentReference>,
    #[serde(default)]
    pub breadcrumbs: Vec<Breadcrumb>,
    /// Navigation tree binding script for this page.
    #[serde(default)]
    pub navigation: String,
}

impl PageNode {
    /// Create a page with a freshly generated identifier.
    pub fn new(action_id: impl Into<String>, title: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action_id: action_id.into(),
            title: title.into(),
            location: location.into(),
            content: Vec::new(),
            breadcrumbs: Vec::new(),
            navigation: String::new(),
        }
    }

    /// File name of the persisted page.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.json", self.id)
    }

    /// Persist the page as `<dir>/<id>.json` and return the written path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, ModelError> {
        let path = dir.join(self.file_name());
        let json = serde_json::to_vec_pretty(self).map_err(|source| ModelError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| ModelError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(page = %self.id, path = %path.display(), "Saved page");
        Ok(path)
    }

    /// Load a page persisted with [`PageNode::save`].
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ModelError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Shared chrome applied to every page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageTemplate {
    /// Appended to every page title, e.g. `" | Flow"`.
    pub title: Option<String>,
    pub stylesheets: Vec<String>,
    pub scripts: Vec<String>,
    /// HTML fragment rendered above the content.
    pub header: Option<String>,
    /// HTML fragment rendered below the content.
    pub footer: Option<String>,
}

impl PageTemplate {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ModelError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_content_reference_resolve_parent() {
        let reference = ContentReference::new("../content/abc.html");

        let resolved = reference.resolve(Path::new("/staging/pages"));

        assert_eq!(resolved, PathBuf::from("/staging/content/abc.html"));
    }

    #[test]
    fn test_page_ids_are_unique() {
        let a = PageNode::new("x", "X", "x.html");
        let b = PageNode::new("x", "X", "x.html");

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_save_and_load_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut page = PageNode::new("intro", "Introduction", "intro.html");
        page.content.push(ContentReference::new("../content/intro.html"));
        page.breadcrumbs.push(Breadcrumb {
            text: "Home".to_owned(),
            location: Some("index.html".to_owned()),
        });

        let path = page.save(dir.path()).unwrap();
        let loaded = PageNode::load(&path).unwrap();

        assert_eq!(path.file_name().unwrap().to_str().unwrap(), page.file_name());
        assert_eq!(loaded, page);
    }

    #[test]
    fn test_load_missing_page_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = PageNode::load(&dir.path().join("nope.json")).unwrap_err();

        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn test_page_template_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.yml");
        fs::write(&path, "title: \" | Demo\"\nstylesheets:\n  - css/site.css\n").unwrap();

        let template = PageTemplate::load(&path).unwrap();

        assert_eq!(template.title.as_deref(), Some(" | Demo"));
        assert_eq!(template.stylesheets, vec!["css/site.css".to_owned()]);
        assert!(template.scripts.is_empty());
        assert!(template.footer.is_none());
    }
}
