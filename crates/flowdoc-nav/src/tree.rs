//! Site-map tree construction.

use flowdoc_model::{ActionNode, Relation};
use serde_json::{Map, Value, json};

use crate::LocationResolver;
use crate::script::{self, ACTION_ID_ATTRIBUTE, STATE_KEY};

/// Maximum number of characters of node text shown in the tree.
pub const MAX_TEXT_LENGTH: usize = 50;

/// Navigation tree error.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    /// A page action has no location to link to.
    #[error("Cannot resolve location of action {id} ({text})")]
    UnresolvedLocation { id: String, text: String },
    /// Tree serialization failed.
    #[error("Failed to serialize navigation tree: {0}")]
    Json(#[from] serde_json::Error),
}

/// Truncate `text` to [`MAX_TEXT_LENGTH`] characters, appending `...` if cut.
///
/// ```
/// use flowdoc_nav::truncate_text;
///
/// assert_eq!(truncate_text("short"), "short");
/// assert_eq!(truncate_text(&"x".repeat(51)), format!("{}...", "x".repeat(50)));
/// ```
#[must_use]
pub fn truncate_text(text: &str) -> String {
    match text.char_indices().nth(MAX_TEXT_LENGTH) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}

/// Builds site-map trees from an action hierarchy.
///
/// Every action reachable from the root is mapped to one tree node, except
/// actions contained as sections (and their descendants), which render on
/// their parent's page. When an action owns mapped children through more than
/// one relation, the children are grouped under one labeled node per relation,
/// ordered by label.
pub struct TreeBuilder<'a, R: LocationResolver + ?Sized> {
    resolver: &'a R,
}

impl<'a, R: LocationResolver + ?Sized> TreeBuilder<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        Self { resolver }
    }

    /// Build the tree for the page at site-relative `base`.
    ///
    /// Links in the tree are relative to `base`. Containers become leaves
    /// without a link.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::UnresolvedLocation`] if a page action has no
    /// location.
    pub fn build(&self, root: &ActionNode, base: &str) -> Result<NavTree, NavError> {
        let roots = vec![self.map_node(root, base)?];
        Ok(NavTree { roots })
    }

    fn map_node(&self, node: &ActionNode, base: &str) -> Result<Value, NavError> {
        let mut object = Map::new();
        object.insert("text".to_owned(), Value::String(truncate_text(&node.text)));
        if let Some(icon) = &node.icon {
            object.insert("icon".to_owned(), Value::String(icon.clone()));
        }
        object.insert(ACTION_ID_ATTRIBUTE.to_owned(), Value::String(node.id.clone()));

        if node.is_page() {
            let href = self.resolver.resolve(node, base).ok_or_else(|| {
                NavError::UnresolvedLocation {
                    id: node.id.clone(),
                    text: node.text.clone(),
                }
            })?;
            object.insert("a_attr".to_owned(), json!({ "href": href }));
        }

        let mut groups = Vec::new();
        for (relation, nodes) in node.containments() {
            if relation == Relation::Sections {
                continue;
            }
            let children = nodes
                .iter()
                .map(|child| self.map_node(child, base))
                .collect::<Result<Vec<_>, _>>()?;
            groups.push((relation.label(), children));
        }

        let children: Vec<Value> = if groups.len() > 1 {
            groups.sort_by(|a, b| a.0.cmp(&b.0));
            groups
                .into_iter()
                .map(|(label, children)| json!({ "text": label, "children": children }))
                .collect()
        } else {
            groups.into_iter().flat_map(|(_, children)| children).collect()
        };
        if !children.is_empty() {
            object.insert("children".to_owned(), Value::Array(children));
        }

        Ok(Value::Object(object))
    }
}

/// A built site-map tree.
#[derive(Clone, Debug, PartialEq)]
pub struct NavTree {
    /// Top-level tree nodes.
    pub roots: Vec<Value>,
}

impl NavTree {
    /// jsTree configuration with the search and state plugins enabled.
    #[must_use]
    pub fn config(&self) -> Value {
        json!({
            "core": { "data": self.roots },
            "plugins": ["state", "search"],
            "search": { "case_sensitive": true, "show_only_matches": true },
            "state": { "key": STATE_KEY },
        })
    }

    /// Script binding the tree to the element with the given id.
    ///
    /// `<` is escaped in the embedded JSON so node text cannot close the
    /// surrounding script element.
    pub fn binding_script(&self, element_id: &str) -> Result<String, NavError> {
        let config = serde_json::to_string(&self.config())?.replace('<', "\\u003c");
        Ok(script::binding_script(&config, element_id))
    }

    /// Action identifiers of all nodes in pre-order.
    #[must_use]
    pub fn action_ids(&self) -> Vec<&str> {
        fn collect<'v>(value: &'v Value, out: &mut Vec<&'v str>) {
            if let Some(id) = value.get(ACTION_ID_ATTRIBUTE).and_then(Value::as_str) {
                out.push(id);
            }
            if let Some(children) = value.get("children").and_then(Value::as_array) {
                for child in children {
                    collect(child, out);
                }
            }
        }

        let mut out = Vec::new();
        for root in &self.roots {
            collect(root, &mut out);
        }
        out
    }
}
