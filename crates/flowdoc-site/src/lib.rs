//! Site assembly for flowdoc.
//!
//! Assembly runs in two passes:
//!
//! 1. [`SiteAssembler::assemble`] walks the action tree, renders every action's
//!    content into the staging area with a [`ContentRenderer`], persists one
//!    [`PageNode`](flowdoc_model::PageNode) per page action and returns the
//!    [`Manifest`] together with the queue of [`PageJob`]s.
//! 2. [`render_pages`] drains the queue on a bounded worker pool, converting
//!    each persisted page to HTML with a [`PageRenderer`].
//!
//! [`materialize`] then validates the manifest and writes every entry into a
//! [`Container`].

mod assembler;
mod container;
mod error;
mod manifest;
mod render;
mod staging;

pub use assembler::{Assembly, PageJob, SiteAssembler, render_pages};
pub use container::{Container, FsContainer, materialize};
pub use error::SiteError;
pub use manifest::{EntrySource, Manifest, ManifestEntry};
pub use render::{
    ContentRenderer, MarkdownContentRenderer, PageRenderer, RenderContext, SITE_MAP_TOKEN,
    TemplatePageRenderer, escape_html,
};
pub use staging::Staging;
