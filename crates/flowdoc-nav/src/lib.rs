//! Navigation for flowdoc sites.
//!
//! [`Locations`] assigns every action a site-relative output location and
//! resolves it relative to the page that links to it. [`TreeBuilder`] turns an
//! action hierarchy into a site-map tree for the jsTree widget, and
//! [`NavTree::binding_script`] produces the script that binds the tree to the
//! navigation panel of a page.

mod location;
mod script;
mod tree;

pub use location::{LocationResolver, Locations, relative_path};
pub use script::{ACTION_ID_ATTRIBUTE, STATE_KEY, TREE_ELEMENT_ID};
pub use tree::{MAX_TEXT_LENGTH, NavError, NavTree, TreeBuilder, truncate_text};
