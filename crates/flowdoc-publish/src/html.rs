//! Lenient inspection of rendered pages.

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;

/// Class marking the element that holds a page's indexable content.
pub const CONTENT_CLASS: &str = "fd-content";

static RAW_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)(<(script|style)\b[^>]*>).*?(</(script|style)\s*>)").unwrap());

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// What the indexer needs from one page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageAnalysis {
    /// Text of `<title>`.
    pub title: Option<String>,
    /// Whitespace-normalised text of the content element, if present.
    pub content: Option<String>,
    /// Link targets in document order.
    pub links: Vec<String>,
}

impl PageAnalysis {
    /// Inspect `html`.
    ///
    /// Script and style bodies are ignored. Malformed markup stops the scan
    /// and keeps whatever was collected so far.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let html = RAW_TEXT.replace_all(html, "$1$3");
        let mut reader = Reader::from_str(&html);
        let config = reader.config_mut();
        config.trim_text(false);
        config.enable_all_checks(false);

        let mut scan = Scan::default();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => scan.open(&e, false),
                Ok(Event::Empty(e)) => scan.open(&e, true),
                Ok(Event::End(e)) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase();
                    scan.close(&name);
                }
                Ok(Event::Text(e)) => {
                    let text = reader
                        .decoder()
                        .decode(&e)
                        .map_or_else(|_| String::from_utf8_lossy(&e).into_owned(), Cow::into_owned);
                    scan.text(&text);
                }
                Ok(Event::GeneralRef(e)) => {
                    let name = String::from_utf8_lossy(&e);
                    if let Some(text) = decode_entity(&name) {
                        scan.text(&text);
                    }
                }
                Ok(Event::CData(e)) => scan.text(&String::from_utf8_lossy(&e)),
                Ok(Event::Eof) => break,
                Ok(Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_)) => {}
                Err(err) => {
                    tracing::debug!(position = reader.error_position(), error = %err, "Stopped page scan");
                    break;
                }
            }
        }
        scan.finish()
    }
}

/// Open element names are kept as a stack. An end tag closes the nearest
/// open element of the same name along with everything opened after it, so
/// optional end tags (`<p>`, `<li>`) cannot leak text past their parent.
#[derive(Default)]
struct Scan {
    open: Vec<String>,
    in_title: bool,
    title: Option<String>,
    /// Stack index of the content element while it is open.
    content_at: Option<usize>,
    content: Option<String>,
    links: Vec<String>,
}

impl Scan {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase();
        let link_attr = match name.as_str() {
            "a" | "link" => Some("href"),
            "script" | "img" | "iframe" => Some("src"),
            _ => None,
        };

        let mut is_content = false;
        for attr in e.html_attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_ascii_lowercase();
            let value = attr
                .unescape_value()
                .map_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned(), Cow::into_owned);
            if link_attr == Some(key.as_str()) {
                self.links.push(value.trim().to_owned());
            } else if key == "class" {
                is_content = value.split_whitespace().any(|class| class == CONTENT_CLASS);
            }
        }

        self.separate();
        if empty || VOID_ELEMENTS.contains(&name.as_str()) {
            return;
        }

        if name == "title" {
            self.in_title = true;
            self.title.get_or_insert_default();
        }
        if is_content && self.content.is_none() {
            self.content_at = Some(self.open.len());
            self.content = Some(String::new());
        }
        self.open.push(name);
    }

    fn close(&mut self, name: &str) {
        // Stray end tags are ignored.
        let Some(index) = self.open.iter().rposition(|open| open == name) else {
            return;
        };
        if self.open[index..].iter().any(|open| open == "title") {
            self.in_title = false;
        }
        if self.content_at.is_some_and(|at| at >= index) {
            self.content_at = None;
        }
        self.open.truncate(index);
        self.separate();
    }

    fn separate(&mut self) {
        if self.content_at.is_some()
            && let Some(content) = &mut self.content
        {
            content.push(' ');
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_title
            && let Some(title) = &mut self.title
        {
            title.push_str(text);
        }
        if self.content_at.is_some()
            && let Some(content) = &mut self.content
        {
            content.push_str(text);
        }
    }

    fn finish(self) -> PageAnalysis {
        PageAnalysis {
            title: self.title.map(|t| normalize(&t)),
            content: self.content.map(|c| normalize(&c)),
            links: self.links.into_iter().filter(|l| !l.is_empty()).collect(),
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entity(name: &str) -> Option<String> {
    let decoded = match name {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "apos" => '\'',
        "quot" => '"',
        "nbsp" => ' ',
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some(decoded.to_string())
}
