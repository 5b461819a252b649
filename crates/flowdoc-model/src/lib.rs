//! Model types for the flowdoc site generator.
//!
//! The generator consumes an action tree that was produced by an external
//! loader (a diagram converter, hand-written YAML, ...). This crate defines:
//!
//! - [`ActionNode`] and [`ActionTree`]: the navigable action hierarchy with
//!   its named containment relations ([`Relation`])
//! - [`PageNode`] and [`ContentReference`]: independently renderable pages and
//!   the references to the staged content they are made of
//! - [`PageTemplate`]: the shared chrome applied to every page
//! - [`Diagnostic`] and [`Severity`]: structured problem reports returned by
//!   every stage instead of a shared mutable collector
//! - [`Deadline`]: a copyable cancellation token checked between units of work
//!
//! # Example
//!
//! ```
//! use flowdoc_model::ActionTree;
//!
//! let tree = ActionTree::from_yaml_str(
//!     "text: Home\nchildren:\n  - id: intro\n    text: Introduction\n",
//! )?;
//! assert_eq!(tree.root().children[0].id, "intro");
//! assert!(!tree.validate().is_error());
//! # Ok::<(), flowdoc_model::ModelError>(())
//! ```

mod action;
mod deadline;
mod diagnostic;
mod page;
mod tree;

pub use action::{ActionKind, ActionNode, NodeRef, Relation, name_to_label};
pub use deadline::{Cancelled, Deadline};
pub use diagnostic::{Diagnostic, Severity};
pub use page::{Breadcrumb, ContentReference, PageNode, PageTemplate};
pub use tree::{ActionTree, BASE_URI, ModelError};
