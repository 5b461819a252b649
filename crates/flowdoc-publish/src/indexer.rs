//! Sitemap and search indexing of a publish directory.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flowdoc_model::{Cancelled, Deadline};
use quick_xml::escape::escape;
use rayon::prelude::*;
use serde::Serialize;

use crate::sitemap::{SitemapEntry, write_sitemap};
use crate::walk::collect_files;
use crate::{PageAnalysis, PathPatterns, links};

/// Sitemap file written at the publish root.
pub const SITEMAP_FILE: &str = "sitemap.xml";

/// Error from indexing a publish directory.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Publish directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write sitemap: {0}")]
    Sitemap(String),

    #[error("Failed to serialize search documents: {0}")]
    Json(#[from] serde_json::Error),

    /// Pages link to files that do not exist. Sitemap and search documents
    /// are written before this is reported.
    #[error("There are broken links: {0}")]
    BrokenLinks(usize),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl IndexError {
    fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// Searchable text of one page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchDocument {
    pub path: String,
    pub title: String,
    pub content: String,
}

/// A link on `page` whose target does not exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrokenLink {
    pub page: String,
    pub link: String,
}

/// Counts from one indexing run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub pages: usize,
    pub documents: usize,
}

#[derive(Clone, Debug)]
pub struct IndexerConfig {
    /// Site URL without trailing slash.
    pub base_url: String,
    /// Pages left out of the search documents.
    pub exclude: PathPatterns,
    /// Search documents script, relative to the publish root.
    pub documents_file: String,
    /// Global variable the search documents are assigned to.
    pub variable: String,
    /// Search library loaded by every page.
    pub library_url: String,
    /// Inline search activation script.
    pub search_script: Option<String>,
}

impl IndexerConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            exclude: PathPatterns::default(),
            documents_file: "search-documents.js".to_owned(),
            variable: "searchDocuments".to_owned(),
            library_url: "https://unpkg.com/lunr/lunr.js".to_owned(),
            search_script: None,
        }
    }

    /// Read the activation script from `path`. A missing file leaves pages
    /// without the inline script.
    pub fn load_script(mut self, path: &Path) -> Result<Self, IndexError> {
        if path.is_file() {
            self.search_script = Some(fs::read_to_string(path).map_err(IndexError::io(path))?);
        } else {
            tracing::warn!(path = %path.display(), "Search script not found");
        }
        Ok(self)
    }
}

struct PageResult {
    path: String,
    lastmod: DateTime<Utc>,
    document: Option<SearchDocument>,
    broken: Vec<String>,
}

/// Walks a publish directory and writes the sitemap and search index.
pub struct Indexer {
    config: IndexerConfig,
    deadline: Deadline,
}

impl Indexer {
    #[must_use]
    pub fn new(config: IndexerConfig) -> Self {
        Self {
            config,
            deadline: Deadline::none(),
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Index every HTML page under `root`.
    pub fn index(&self, root: &Path) -> Result<IndexReport, IndexError> {
        self.index_with(root, &mut |_| {})
    }

    /// Index every HTML page under `root`, reporting broken links to `on_broken`.
    ///
    /// Pages are inspected in parallel and merged in path order, so the
    /// sitemap, the search documents and the broken-link reports are
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::BrokenLinks`] after writing all output if any
    /// page links to a missing file.
    pub fn index_with(
        &self,
        root: &Path,
        on_broken: &mut dyn FnMut(&BrokenLink),
    ) -> Result<IndexReport, IndexError> {
        if !root.is_dir() {
            return Err(IndexError::NotFound(root.to_path_buf()));
        }

        let files = collect_files(root).map_err(IndexError::io(root))?;
        let known: HashSet<String> = files.iter().map(|(rel, _)| rel.clone()).collect();
        let pages: Vec<_> = files.iter().filter(|(rel, _)| is_page(rel)).collect();

        let results: Vec<Result<PageResult, IndexError>> = pages
            .par_iter()
            .map(|(rel, path)| {
                self.deadline.check("index")?;
                self.index_page(rel, path, &known)
            })
            .collect();

        let mut sitemap = Vec::with_capacity(pages.len());
        let mut documents = BTreeMap::new();
        let mut broken = 0;
        for result in results {
            let page = result?;
            sitemap.push(SitemapEntry {
                loc: format!("{}/{}", self.config.base_url, page.path),
                lastmod: page.lastmod,
            });
            for link in page.broken {
                tracing::warn!(page = %page.path, link = %link, "Broken link");
                on_broken(&BrokenLink {
                    page: page.path.clone(),
                    link,
                });
                broken += 1;
            }
            if let Some(document) = page.document {
                documents.insert(page.path, document);
            }
        }

        let sitemap_path = root.join(SITEMAP_FILE);
        fs::write(&sitemap_path, write_sitemap(&sitemap)?).map_err(IndexError::io(&sitemap_path))?;

        let documents_path = root.join(&self.config.documents_file);
        let script = format!(
            "var {} = {};\n",
            self.config.variable,
            serde_json::to_string_pretty(&documents)?
        );
        fs::write(&documents_path, script).map_err(IndexError::io(&documents_path))?;

        let report = IndexReport {
            pages: sitemap.len(),
            documents: documents.len(),
        };
        tracing::info!(
            root = %root.display(),
            pages = report.pages,
            documents = report.documents,
            broken,
            "Indexed site"
        );

        if broken > 0 {
            return Err(IndexError::BrokenLinks(broken));
        }
        Ok(report)
    }

    fn index_page(&self, rel: &str, path: &Path, known: &HashSet<String>) -> Result<PageResult, IndexError> {
        let html = fs::read_to_string(path).map_err(IndexError::io(path))?;
        let analysis = PageAnalysis::parse(&html);

        let broken = analysis
            .links
            .iter()
            .filter(|link| links::is_checked(link) && !links::exists(rel, link, known))
            .cloned()
            .collect();

        let document = if self.config.exclude.matches(rel) {
            None
        } else {
            analysis.content.map(|content| SearchDocument {
                path: rel.to_owned(),
                title: analysis.title.unwrap_or_default(),
                content,
            })
        };

        if let Some(rewritten) = self.inject_head(rel, &html) {
            fs::write(path, rewritten).map_err(IndexError::io(path))?;
        }
        let lastmod = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(IndexError::io(path))?;

        tracing::debug!(page = %rel, "Indexed page");
        Ok(PageResult {
            path: rel.to_owned(),
            lastmod: lastmod.into(),
            document,
            broken,
        })
    }

    /// Page with the search scripts inserted before `</head>`.
    ///
    /// Returns `None` if the page has no head or already references the
    /// search documents.
    fn inject_head(&self, rel: &str, html: &str) -> Option<String> {
        let prefix = "../".repeat(rel.matches('/').count());
        let documents = format!("src=\"{prefix}{}\"", escape(self.config.documents_file.as_str()));
        if html.contains(&documents) {
            return None;
        }
        let Some(at) = html.to_ascii_lowercase().find("</head>") else {
            tracing::debug!(page = %rel, "Page has no head");
            return None;
        };

        let mut block = format!(
            "<script {documents}></script>\n<script src=\"{}\"></script>\n",
            escape(self.config.library_url.as_str())
        );
        if let Some(script) = &self.config.search_script {
            block.push_str("<script>\n");
            block.push_str(script);
            block.push_str("\n</script>\n");
        }

        let mut rewritten = String::with_capacity(html.len() + block.len());
        rewritten.push_str(&html[..at]);
        rewritten.push_str(&block);
        rewritten.push_str(&html[at..]);
        Some(rewritten)
    }
}

fn is_page(rel: &str) -> bool {
    rel.ends_with(".html")
}
