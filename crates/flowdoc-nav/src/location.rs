//! Output locations of actions.

use std::collections::HashMap;

use flowdoc_model::{ActionNode, BASE_URI, Relation};

/// Resolves the location of an action relative to a base page.
///
/// Implemented for [`Locations`] and for plain closures, so tests and
/// alternative layouts can plug in their own resolution.
pub trait LocationResolver {
    /// Location of `node` relative to the page at site-relative `base`.
    ///
    /// Returns `None` when the node has no location of its own.
    fn resolve(&self, node: &ActionNode, base: &str) -> Option<String>;
}

impl<F> LocationResolver for F
where
    F: Fn(&ActionNode, &str) -> Option<String>,
{
    fn resolve(&self, node: &ActionNode, base: &str) -> Option<String> {
        self(node, base)
    }
}

/// Site-relative locations of every action in a tree.
///
/// - an explicit `location` is used with the `${base-uri}` token and any
///   leading `/` stripped
/// - other page actions live at `<id>.html`
/// - sections live on their parent's page at `<page>#<id>`
/// - containers, and sections of containers, have no location
#[derive(Debug, Default)]
pub struct Locations {
    by_id: HashMap<String, String>,
}

impl Locations {
    /// Compute locations for `root` and all of its descendants.
    #[must_use]
    pub fn compute(root: &ActionNode) -> Self {
        let mut by_id: HashMap<String, String> = HashMap::new();

        for r in root.walk() {
            let node = r.node;
            let location = if r.relation == Some(Relation::Sections) {
                r.parent
                    .and_then(|p| by_id.get(&p.id))
                    .map(|parent| format!("{}#{}", page_part(parent), node.id))
            } else if let Some(explicit) = &node.location {
                Some(
                    explicit
                        .trim_start_matches(BASE_URI)
                        .trim_start_matches('/')
                        .to_owned(),
                )
            } else if node.is_page() {
                Some(format!("{}.html", node.id))
            } else {
                None
            };

            if let Some(location) = location {
                by_id.insert(node.id.clone(), location);
            }
        }

        tracing::debug!(count = by_id.len(), "Computed action locations");
        Self { by_id }
    }

    /// Site-relative location of the action with the given id.
    #[must_use]
    pub fn location(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    /// Relative path from the page at `base` to the site root.
    ///
    /// Empty for pages at the root, `../` for pages one level down.
    #[must_use]
    pub fn base_uri(base: &str) -> String {
        let path = relative_path(base, "");
        if path == "./" { String::new() } else { path }
    }

    /// Resolve a site-relative location against the page at `base`.
    #[must_use]
    pub fn relativize(location: &str, base: &str) -> String {
        if location.contains("://") {
            return location.to_owned();
        }
        match location.split_once('#') {
            Some((path, fragment)) if path == page_part(base) => format!("#{fragment}"),
            Some((path, fragment)) => format!("{}#{fragment}", relative_path(base, path)),
            None => relative_path(base, location),
        }
    }
}

impl LocationResolver for Locations {
    fn resolve(&self, node: &ActionNode, base: &str) -> Option<String> {
        self.location(&node.id)
            .map(|location| Self::relativize(location, base))
    }
}

fn page_part(location: &str) -> &str {
    location.split_once('#').map_or(location, |(page, _)| page)
}

/// Compute a relative URL from one page to another (RFC 3986).
///
/// Both `from` and `to` are site-relative paths without leading slash. The
/// last segment of `from` is the current document, so the base directory is
/// everything before it.
///
/// # Examples
///
/// ```
/// use flowdoc_nav::relative_path;
///
/// assert_eq!(relative_path("guide/intro.html", "guide/faq.html"), "faq.html");
/// assert_eq!(relative_path("index.html", "guide/faq.html"), "guide/faq.html");
/// assert_eq!(relative_path("guide/intro.html", "index.html"), "../index.html");
/// ```
pub fn relative_path(from: &str, to: &str) -> String {
    let from_segs: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let to_segs: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    // Trailing slash means the document is empty and all segments are the directory.
    let from_dir = if from.ends_with('/') || from_segs.is_empty() {
        &from_segs[..]
    } else {
        &from_segs[..from_segs.len() - 1]
    };

    // Keep the last segment of `to` even when it matches a directory name.
    let to_dirs = to_segs.len().saturating_sub(1);
    let common = from_dir
        .iter()
        .zip(&to_segs[..to_dirs])
        .take_while(|(a, b)| a == b)
        .count();

    let result = format!(
        "{}{}",
        "../".repeat(from_dir.len() - common),
        to_segs[common..].join("/")
    );
    if result.is_empty() {
        "./".to_owned()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use flowdoc_model::ActionKind;
    use pretty_assertions::assert_eq;

    use super::*;

    fn site() -> ActionNode {
        ActionNode::new("root", "Root")
            .with_kind(ActionKind::Container)
            .with(
                Relation::Children,
                ActionNode::new("home", "Home")
                    .with_location("${base-uri}index.html")
                    .with(Relation::Sections, ActionNode::new("intro", "Intro"))
                    .with(
                        Relation::Children,
                        ActionNode::new("guide", "Guide").with_location("guide/index.html"),
                    ),
            )
            .with(
                Relation::Navigation,
                ActionNode::new("group", "Group")
                    .with_kind(ActionKind::Container)
                    .with(Relation::Sections, ActionNode::new("orphan", "Orphan")),
            )
            .with(Relation::Anonymous, ActionNode::new("faq", "FAQ"))
    }

    #[test]
    fn test_compute_locations() {
        let locations = Locations::compute(&site());

        assert_eq!(locations.location("root"), None);
        assert_eq!(locations.location("home"), Some("index.html"));
        assert_eq!(locations.location("intro"), Some("index.html#intro"));
        assert_eq!(locations.location("guide"), Some("guide/index.html"));
        assert_eq!(locations.location("faq"), Some("faq.html"));
    }

    #[test]
    fn test_sections_of_containers_have_no_location() {
        let locations = Locations::compute(&site());

        assert_eq!(locations.location("group"), None);
        assert_eq!(locations.location("orphan"), None);
    }

    #[test]
    fn test_nested_section_uses_page_part() {
        let root = ActionNode::new("p", "Page").with(
            Relation::Sections,
            ActionNode::new("s1", "S1").with(Relation::Sections, ActionNode::new("s2", "S2")),
        );

        let locations = Locations::compute(&root);

        assert_eq!(locations.location("s2"), Some("p.html#s2"));
    }

    #[test]
    fn test_resolve_relative_to_base() {
        let root = site();
        let locations = Locations::compute(&root);
        let faq = &root.anonymous[0];
        let intro = &root.children[0].sections[0];

        assert_eq!(locations.resolve(faq, "guide/index.html"), Some("../faq.html".to_owned()));
        assert_eq!(locations.resolve(intro, "index.html"), Some("#intro".to_owned()));
        assert_eq!(
            locations.resolve(intro, "guide/index.html"),
            Some("../index.html#intro".to_owned())
        );
        assert_eq!(locations.resolve(&root, "index.html"), None);
    }

    #[test]
    fn test_external_location_is_unchanged() {
        assert_eq!(
            Locations::relativize("https://example.com/x.html", "a/b.html"),
            "https://example.com/x.html"
        );
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |node: &ActionNode, _: &str| Some(format!("/{}", node.id));

        assert_eq!(resolver.resolve(&ActionNode::new("x", "X"), ""), Some("/x".to_owned()));
    }

    #[test]
    fn test_base_uri() {
        assert_eq!(Locations::base_uri("index.html"), "");
        assert_eq!(Locations::base_uri("a/b/page.html"), "../../");
    }

    #[test]
    fn test_relative_path_same_page() {
        assert_eq!(relative_path("guide/index.html", "guide/index.html"), "index.html");
    }

    #[test]
    fn test_relative_path_file_named_like_directory() {
        assert_eq!(relative_path("a/b.html", "a"), "../a");
    }

    #[test]
    fn test_relative_path_to_root() {
        assert_eq!(relative_path("a/b.html", ""), "../");
        assert_eq!(relative_path("b.html", ""), "./");
    }

    #[test]
    fn test_relative_path_deep_to_sibling_tree() {
        assert_eq!(relative_path("a/b/c.html", "a/d/e.html"), "../d/e.html");
    }
}
