//! Publishing and indexing of a generated flowdoc site.
//!
//! [`Publisher`] copies the generated site into the publish directory after
//! removing stale files, sparing everything matched by a keep list.
//! [`Indexer`] then walks the publish directory, writes `sitemap.xml` and the
//! search documents script, wires the search scripts into every page and
//! fails the run if any page links to a missing file.

mod html;
mod indexer;
mod links;
mod patterns;
mod publisher;
mod sitemap;
mod walk;

pub use html::{CONTENT_CLASS, PageAnalysis};
pub use indexer::{
    BrokenLink, IndexError, IndexReport, Indexer, IndexerConfig, SITEMAP_FILE, SearchDocument,
};
pub use links::is_external_link;
pub use patterns::PathPatterns;
pub use publisher::{PublishError, PublishSummary, Publisher};
pub use sitemap::{SitemapEntry, write_sitemap};
