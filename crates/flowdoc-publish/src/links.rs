//! Link classification and resolution.

use std::borrow::Cow;
use std::collections::HashSet;

use percent_encoding::percent_decode_str;

/// True if `link` starts with a URI scheme (`https:`, `mailto:`, `data:`).
#[must_use]
pub fn is_external_link(link: &str) -> bool {
    link.find(':').is_some_and(|pos| {
        pos > 0
            && link[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Links the indexer does not check: external, protocol-relative,
/// root-absolute and same-page fragments.
pub(crate) fn is_checked(link: &str) -> bool {
    !(link.is_empty()
        || link.starts_with('#')
        || link.starts_with('/')
        || is_external_link(link))
}

/// Resolve `link` against the page at `page` (both relative to the publish root).
///
/// Query and fragment are dropped and each link segment is percent-decoded.
/// Returns `None` if the link climbs above the root.
pub(crate) fn resolve(page: &str, link: &str) -> Option<String> {
    let path = link.split(['?', '#']).next().unwrap_or_default();

    let mut segments: Vec<Cow<'_, str>> = page.split('/').map(Cow::Borrowed).collect();
    segments.pop();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(percent_decode_str(other).decode_utf8_lossy()),
        }
    }
    let mut resolved = segments.join("/");
    if path.is_empty() {
        resolved = page.to_owned();
    } else if path.ends_with('/') {
        if !resolved.is_empty() {
            resolved.push('/');
        }
        resolved.push_str("index.html");
    }
    Some(resolved)
}

/// True if `link` on `page` points to a file in `files`.
pub(crate) fn exists(page: &str, link: &str, files: &HashSet<String>) -> bool {
    match resolve(page, link) {
        Some(target) => files.contains(&target) || files.contains(&format!("{target}/index.html")),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_external_links() {
        assert!(is_external_link("https://example.com"));
        assert!(is_external_link("mailto:a@example.com"));
        assert!(is_external_link("data:image/png;base64,AAAA"));
        assert!(!is_external_link("guide/index.html"));
        assert!(!is_external_link(":odd"));
        assert!(!is_external_link("a b:c"));
    }

    #[test]
    fn test_checked_links() {
        assert!(is_checked("guide.html"));
        assert!(is_checked("../style.css"));
        assert!(!is_checked("#top"));
        assert!(!is_checked("//cdn.example.com/x.js"));
        assert!(!is_checked("/absolute.html"));
        assert!(!is_checked("https://example.com"));
        assert!(!is_checked(""));
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve("index.html", "guide/a.html").as_deref(), Some("guide/a.html"));
        assert_eq!(resolve("guide/a.html", "../b.html").as_deref(), Some("b.html"));
        assert_eq!(resolve("guide/a.html", "./c.html?x=1#y").as_deref(), Some("guide/c.html"));
        assert_eq!(resolve("guide/a.html", "sub/").as_deref(), Some("guide/sub/index.html"));
        assert_eq!(resolve("guide/a.html", "?q").as_deref(), Some("guide/a.html"));
        assert_eq!(resolve("index.html", "../../etc/passwd"), None);
    }

    #[test]
    fn test_resolve_decodes_percent_escapes() {
        assert_eq!(resolve("index.html", "a%20b.html").as_deref(), Some("a b.html"));
        assert_eq!(resolve("docs/x.html", "caf%C3%A9/").as_deref(), Some("docs/café/index.html"));

        let files: HashSet<String> = HashSet::from(["a b.html".to_owned()]);
        assert!(exists("index.html", "a%20b.html", &files));
    }

    #[test]
    fn test_exists() {
        let files: HashSet<String> = ["index.html", "guide/index.html", "css/site.css"]
            .into_iter()
            .map(str::to_owned)
            .collect();

        assert!(exists("index.html", "guide", &files));
        assert!(exists("guide/index.html", "../css/site.css", &files));
        assert!(exists("guide/index.html", "../index.html#top", &files));
        assert!(!exists("index.html", "missing.html", &files));
    }
}
