//! Action nodes and their containment relations.
//!
//! An [`ActionNode`] owns its descendants through a fixed set of named
//! containment relations. Consumers never match on the individual fields;
//! they go through [`ActionNode::containments`] and [`ActionNode::walk`] so
//! that every relation is treated uniformly.

use serde::{Deserialize, Serialize};

/// Classification of an action node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Node that renders to its own page.
    #[default]
    Page,
    /// Pure grouping node without a page of its own.
    Container,
}

/// Named containment relation between an action and its owned actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    Children,
    Navigation,
    Sections,
    Anonymous,
}

impl Relation {
    /// All relations in declaration order.
    pub const ALL: [Relation; 4] = [
        Relation::Children,
        Relation::Navigation,
        Relation::Sections,
        Relation::Anonymous,
    ];

    /// Relation name as it appears in the YAML model.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Children => "children",
            Self::Navigation => "navigation",
            Self::Sections => "sections",
            Self::Anonymous => "anonymous",
        }
    }

    /// Human-readable label, e.g. `"Children"`.
    #[must_use]
    pub fn label(self) -> String {
        name_to_label(self.name())
    }
}

/// Convert a camel-case or lowercase identifier to a label.
///
/// Words are split at uppercase letters, the first word is capitalized and
/// the remaining words are lowercased.
///
/// ```
/// use flowdoc_model::name_to_label;
///
/// assert_eq!(name_to_label("children"), "Children");
/// assert_eq!(name_to_label("childActions"), "Child actions");
/// ```
#[must_use]
pub fn name_to_label(name: &str) -> String {
    let mut label = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i == 0 {
            label.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            label.push(' ');
            label.extend(c.to_lowercase());
        } else {
            label.push(c);
        }
    }
    label
}

/// A node in the action hierarchy.
///
/// Each node is owned by exactly one parent through one of the containment
/// lists. Identifiers are unique across the whole tree once the node has been
/// placed in an [`ActionTree`](crate::ActionTree).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionNode {
    /// Unique identifier. Generated when absent from the source model.
    #[serde(default)]
    pub id: String,
    /// Display text.
    pub text: String,
    /// Icon reference (CSS class or image URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Explicit output location, may start with `${base-uri}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Markdown content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ActionNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub navigation: Vec<ActionNode>,
    /// Sections render inline on the owning page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<ActionNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anonymous: Vec<ActionNode>,
}

/// A node visited by [`ActionNode::walk`].
#[derive(Clone, Copy, Debug)]
pub struct NodeRef<'a> {
    pub node: &'a ActionNode,
    /// Owning node, `None` for the walk root.
    pub parent: Option<&'a ActionNode>,
    /// Relation through which `parent` owns `node`.
    pub relation: Option<Relation>,
    pub depth: usize,
}

impl NodeRef<'_> {
    /// True if the node is directly contained as a section of its parent.
    #[must_use]
    pub fn is_section(&self) -> bool {
        self.relation == Some(Relation::Sections)
    }
}

impl ActionNode {
    /// Create a page node with the given id and text.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            icon: None,
            location: None,
            content: None,
            kind: ActionKind::Page,
            children: Vec::new(),
            navigation: Vec::new(),
            sections: Vec::new(),
            anonymous: Vec::new(),
        }
    }

    /// Builder-style content setter.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Builder-style location setter.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder-style kind setter.
    #[must_use]
    pub fn with_kind(mut self, kind: ActionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Append a node under the given relation.
    #[must_use]
    pub fn with(mut self, relation: Relation, node: ActionNode) -> Self {
        self.nodes_mut(relation).push(node);
        self
    }

    /// True for nodes that render to their own page.
    #[must_use]
    pub fn is_page(&self) -> bool {
        self.kind == ActionKind::Page
    }

    /// Nodes owned through `relation`.
    #[must_use]
    pub fn nodes(&self, relation: Relation) -> &[ActionNode] {
        match relation {
            Relation::Children => &self.children,
            Relation::Navigation => &self.navigation,
            Relation::Sections => &self.sections,
            Relation::Anonymous => &self.anonymous,
        }
    }

    /// Mutable access to the nodes owned through `relation`.
    pub fn nodes_mut(&mut self, relation: Relation) -> &mut Vec<ActionNode> {
        match relation {
            Relation::Children => &mut self.children,
            Relation::Navigation => &mut self.navigation,
            Relation::Sections => &mut self.sections,
            Relation::Anonymous => &mut self.anonymous,
        }
    }

    /// Non-empty containment relations with their nodes.
    pub fn containments(&self) -> impl Iterator<Item = (Relation, &[ActionNode])> {
        Relation::ALL
            .into_iter()
            .map(|relation| (relation, self.nodes(relation)))
            .filter(|(_, nodes)| !nodes.is_empty())
    }

    /// Pre-order traversal of this node and all of its descendants.
    #[must_use]
    pub fn walk(&self) -> Vec<NodeRef<'_>> {
        fn visit<'a>(
            node: &'a ActionNode,
            parent: Option<&'a ActionNode>,
            relation: Option<Relation>,
            depth: usize,
            out: &mut Vec<NodeRef<'a>>,
        ) {
            out.push(NodeRef {
                node,
                parent,
                relation,
                depth,
            });
            for (rel, nodes) in node.containments() {
                for child in nodes {
                    visit(child, Some(node), Some(rel), depth + 1, out);
                }
            }
        }

        let mut out = Vec::new();
        visit(self, None, None, 0, &mut out);
        out
    }

    /// Visit every node mutably in pre-order.
    pub fn for_each_mut(&mut self, f: &mut impl FnMut(&mut ActionNode)) {
        f(self);
        for relation in Relation::ALL {
            for child in self.nodes_mut(relation) {
                child.for_each_mut(f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> ActionNode {
        ActionNode::new("root", "Root")
            .with(
                Relation::Children,
                ActionNode::new("a", "A").with(Relation::Sections, ActionNode::new("a1", "A1")),
            )
            .with(Relation::Navigation, ActionNode::new("b", "B"))
    }

    #[test]
    fn test_relation_labels() {
        assert_eq!(Relation::Children.label(), "Children");
        assert_eq!(Relation::Sections.label(), "Sections");
        assert_eq!(Relation::Anonymous.label(), "Anonymous");
    }

    #[test]
    fn test_name_to_label_splits_camel_case() {
        assert_eq!(name_to_label("childActions"), "Child actions");
        assert_eq!(name_to_label(""), "");
    }

    #[test]
    fn test_containments_skip_empty_relations() {
        let root = sample();

        let relations: Vec<_> = root.containments().map(|(r, _)| r).collect();

        assert_eq!(relations, vec![Relation::Children, Relation::Navigation]);
    }

    #[test]
    fn test_walk_is_pre_order_with_relations() {
        let root = sample();

        let visited: Vec<_> = root
            .walk()
            .iter()
            .map(|r| (r.node.id.as_str(), r.relation, r.depth))
            .collect();

        assert_eq!(
            visited,
            vec![
                ("root", None, 0),
                ("a", Some(Relation::Children), 1),
                ("a1", Some(Relation::Sections), 2),
                ("b", Some(Relation::Navigation), 1),
            ]
        );
    }

    #[test]
    fn test_walk_records_parent() {
        let root = sample();

        let walk = root.walk();
        let a1 = walk.iter().find(|r| r.node.id == "a1").unwrap();

        assert_eq!(a1.parent.map(|p| p.id.as_str()), Some("a"));
        assert!(a1.is_section());
    }

    #[test]
    fn test_deserialize_defaults() {
        let node: ActionNode = serde_yaml::from_str("text: Hello").unwrap();

        assert_eq!(node.text, "Hello");
        assert!(node.id.is_empty());
        assert_eq!(node.kind, ActionKind::Page);
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_deserialize_container_kind() {
        let node: ActionNode = serde_yaml::from_str("text: Group\nkind: container").unwrap();

        assert!(!node.is_page());
    }

    #[test]
    fn test_for_each_mut_visits_all() {
        let mut root = sample();
        let mut count = 0;

        root.for_each_mut(&mut |n| {
            n.text.push('!');
            count += 1;
        });

        assert_eq!(count, 4);
        assert_eq!(root.children[0].sections[0].text, "A1!");
    }
}
