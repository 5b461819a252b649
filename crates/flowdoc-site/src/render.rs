//! Content and page renderers.
//!
//! [`ContentRenderer`] turns one action into an HTML fragment during the
//! first pass. [`PageRenderer`] wraps the concatenated fragments of a
//! persisted page into a complete document during the second pass.

use std::fmt::Write;

use flowdoc_model::{ActionNode, BASE_URI, PageNode, PageTemplate};
use flowdoc_nav::{Locations, NavError, NavTree, TREE_ELEMENT_ID};
use pulldown_cmark::{Options, Parser, html};

use crate::SiteError;

/// Content token replaced with an inline site-map tree.
pub const SITE_MAP_TOKEN: &str = "${site-map-tree-script}";

/// Element id of an inline site-map tree.
const SITE_MAP_ELEMENT_ID: &str = "fd-site-map";

/// Per-page context passed to a [`ContentRenderer`].
pub struct RenderContext<'a> {
    /// Site-relative location of the page the content is rendered into.
    pub location: &'a str,
    nav: &'a NavTree,
}

impl<'a> RenderContext<'a> {
    pub fn new(location: &'a str, nav: &'a NavTree) -> Self {
        Self { location, nav }
    }

    /// Relative path from the page to the site root.
    #[must_use]
    pub fn base_uri(&self) -> String {
        Locations::base_uri(self.location)
    }

    /// Inline site-map tree markup for this page.
    pub fn site_map_html(&self) -> Result<String, NavError> {
        let script = self.nav.binding_script(SITE_MAP_ELEMENT_ID)?;
        Ok(format!(
            "<div id=\"{SITE_MAP_ELEMENT_ID}\"></div>\n<script>\n{script}</script>\n"
        ))
    }
}

/// Renders the content of one action to an HTML fragment.
pub trait ContentRenderer: Send + Sync {
    /// Render `node` for the page described by `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be rendered.
    fn render(&self, node: &ActionNode, ctx: &RenderContext<'_>) -> Result<Vec<u8>, SiteError>;
}

/// Renders action content as `CommonMark` with GFM extensions.
///
/// `${base-uri}` is replaced before parsing so it can be used in link
/// targets. `${site-map-tree-script}` is replaced after rendering, and only
/// then is the site-map script built.
#[derive(Debug, Default)]
pub struct MarkdownContentRenderer;

impl MarkdownContentRenderer {
    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM
    }
}

impl ContentRenderer for MarkdownContentRenderer {
    fn render(&self, node: &ActionNode, ctx: &RenderContext<'_>) -> Result<Vec<u8>, SiteError> {
        let Some(markdown) = node.content.as_deref() else {
            return Ok(Vec::new());
        };
        let markdown = markdown.replace(BASE_URI, &ctx.base_uri());

        let mut out = String::with_capacity(markdown.len() * 2);
        html::push_html(&mut out, Parser::new_ext(&markdown, Self::options()));

        if out.contains(SITE_MAP_TOKEN) {
            let site_map = ctx.site_map_html()?;
            out = out
                .replace(&format!("<p>{SITE_MAP_TOKEN}</p>\n"), &site_map)
                .replace(SITE_MAP_TOKEN, &site_map);
        }
        Ok(out.into_bytes())
    }
}

/// Renders a persisted page into a complete HTML document.
pub trait PageRenderer: Send + Sync {
    /// Render `page` around its concatenated `content`.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be rendered.
    fn render(&self, page: &PageNode, content: &str) -> Result<Vec<u8>, SiteError>;
}

/// Renders pages with the shared [`PageTemplate`] chrome.
///
/// Layout: header, navigation panel bound to the site-map tree, breadcrumbs,
/// `<div class="fd-content">` with the page content, footer.
#[derive(Debug, Default)]
pub struct TemplatePageRenderer {
    template: PageTemplate,
}

impl TemplatePageRenderer {
    #[must_use]
    pub fn new(template: PageTemplate) -> Self {
        Self { template }
    }
}

impl PageRenderer for TemplatePageRenderer {
    fn render(&self, page: &PageNode, content: &str) -> Result<Vec<u8>, SiteError> {
        let base_uri = Locations::base_uri(&page.location);
        let site_url = |url: &str| {
            if is_site_relative(url) {
                format!("{base_uri}{url}")
            } else {
                url.to_owned()
            }
        };

        let mut out = String::with_capacity(content.len() + 4096);
        out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        out.push_str("<meta charset=\"utf-8\"/>\n");
        out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>\n");
        let title = format!(
            "{}{}",
            page.title,
            self.template.title.as_deref().unwrap_or_default()
        );
        let _ = writeln!(out, "<title>{}</title>", escape_html(&title));
        for href in &self.template.stylesheets {
            let _ = writeln!(
                out,
                "<link rel=\"stylesheet\" href=\"{}\"/>",
                escape_html(&site_url(href))
            );
        }
        for src in &self.template.scripts {
            let _ = writeln!(out, "<script src=\"{}\"></script>", escape_html(&site_url(src)));
        }
        out.push_str("</head>\n<body>\n");

        if let Some(header) = &self.template.header {
            out.push_str(&header.replace(BASE_URI, &base_uri));
            out.push('\n');
        }

        out.push_str("<div class=\"fd-layout\">\n");
        let _ = writeln!(out, "<nav id=\"{TREE_ELEMENT_ID}\" class=\"fd-nav\"></nav>");
        out.push_str("<main class=\"fd-main\">\n");
        render_breadcrumbs(&mut out, page);
        out.push_str("<div class=\"fd-content\">\n");
        let _ = writeln!(out, "<h1>{}</h1>", escape_html(&page.title));
        out.push_str(content);
        out.push_str("\n</div>\n</main>\n</div>\n");

        if let Some(footer) = &self.template.footer {
            out.push_str(&footer.replace(BASE_URI, &base_uri));
            out.push('\n');
        }
        if !page.navigation.is_empty() {
            let _ = write!(out, "<script>\n{}</script>\n", page.navigation);
        }
        out.push_str("</body>\n</html>\n");
        Ok(out.into_bytes())
    }
}

fn render_breadcrumbs(out: &mut String, page: &PageNode) {
    if page.breadcrumbs.is_empty() {
        return;
    }
    out.push_str("<ol class=\"fd-breadcrumbs\">\n");
    for crumb in &page.breadcrumbs {
        match &crumb.location {
            Some(href) => {
                let _ = writeln!(
                    out,
                    "<li><a href=\"{}\">{}</a></li>",
                    escape_html(href),
                    escape_html(&crumb.text)
                );
            }
            None => {
                let _ = writeln!(out, "<li>{}</li>", escape_html(&crumb.text));
            }
        }
    }
    let _ = writeln!(out, "<li>{}</li>", escape_html(&page.title));
    out.push_str("</ol>\n");
}

fn is_site_relative(url: &str) -> bool {
    !(url.contains("://") || url.starts_with("//") || url.starts_with('/'))
}

/// Escape text for use in HTML content and attribute values.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use flowdoc_model::Breadcrumb;
    use pretty_assertions::assert_eq;

    use super::*;

    fn empty_nav() -> NavTree {
        NavTree { roots: Vec::new() }
    }

    fn render_markdown(markdown: &str, location: &str) -> String {
        let nav = empty_nav();
        let ctx = RenderContext::new(location, &nav);
        let node = ActionNode::new("a", "A").with_content(markdown);
        String::from_utf8(MarkdownContentRenderer.render(&node, &ctx).unwrap()).unwrap()
    }

    #[test]
    fn test_markdown_rendered() {
        assert_eq!(render_markdown("# Title\n\nSome *text*.", "a.html"), "<h1>Title</h1>\n<p>Some <em>text</em>.</p>\n");
    }

    #[test]
    fn test_no_content_renders_empty() {
        let nav = empty_nav();
        let ctx = RenderContext::new("a.html", &nav);

        let out = MarkdownContentRenderer.render(&ActionNode::new("a", "A"), &ctx).unwrap();

        assert!(out.is_empty());
    }

    #[test]
    fn test_base_uri_token_in_links() {
        let html = render_markdown("[Home](${base-uri}index.html)", "guide/intro.html");

        assert_eq!(html, "<p><a href=\"../index.html\">Home</a></p>\n");
    }

    #[test]
    fn test_site_map_token_replaced() {
        let html = render_markdown("Map:\n\n${site-map-tree-script}\n", "map.html");

        assert!(!html.contains(SITE_MAP_TOKEN));
        assert!(html.contains("<div id=\"fd-site-map\"></div>"));
        assert!(html.contains("$('#fd-site-map').jstree(tree);"));
        assert!(!html.contains("<p><div"));
    }

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a&b"), "a&amp;b");
        assert_eq!(escape_html("\"hello\""), "&quot;hello&quot;");
    }

    #[test]
    fn test_page_template_layout() {
        let template = PageTemplate {
            title: Some(" | Demo".to_owned()),
            stylesheets: vec!["css/site.css".to_owned(), "https://cdn.example.com/x.css".to_owned()],
            scripts: vec!["js/jstree.js".to_owned()],
            header: Some("<header><a href=\"${base-uri}index.html\">Demo</a></header>".to_owned()),
            footer: Some("<footer>Footer</footer>".to_owned()),
        };
        let mut page = PageNode::new("intro", "Intro & Setup", "guide/intro.html");
        page.breadcrumbs.push(Breadcrumb {
            text: "Home".to_owned(),
            location: Some("../index.html".to_owned()),
        });
        page.navigation = "bind();\n".to_owned();

        let bytes = TemplatePageRenderer::new(template).render(&page, "<p>Body</p>").unwrap();
        let html = String::from_utf8(bytes).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Intro &amp; Setup | Demo</title>"));
        assert!(html.contains("<link rel=\"stylesheet\" href=\"../css/site.css\"/>"));
        assert!(html.contains("href=\"https://cdn.example.com/x.css\""));
        assert!(html.contains("<script src=\"../js/jstree.js\"></script>"));
        assert!(html.contains("<a href=\"../index.html\">Demo</a>"));
        assert!(html.contains("<nav id=\"fd-site-map-tree\" class=\"fd-nav\"></nav>"));
        assert!(html.contains("<li><a href=\"../index.html\">Home</a></li>"));
        assert!(html.contains("<div class=\"fd-content\">\n<h1>Intro &amp; Setup</h1>\n<p>Body</p>"));
        assert!(html.contains("<footer>Footer</footer>"));
        assert!(html.contains("<script>\nbind();\n</script>"));
        assert!(html.find("</head>") < html.find("<body>"));
    }

    #[test]
    fn test_page_without_breadcrumbs_or_navigation() {
        let page = PageNode::new("home", "Home", "index.html");

        let bytes = TemplatePageRenderer::default().render(&page, "").unwrap();
        let html = String::from_utf8(bytes).unwrap();

        assert!(!html.contains("fd-breadcrumbs"));
        assert!(!html.contains("<script>"));
    }
}
