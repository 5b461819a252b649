use std::fmt::Display;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::IndexError;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const CHANGE_FREQUENCY: &str = "weekly";

/// One `<url>` of the sitemap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: DateTime<Utc>,
}

impl SitemapEntry {
    /// `lastmod` in W3C datetime form.
    #[must_use]
    pub fn lastmod_w3c(&self) -> String {
        self.lastmod.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

fn xml_error(err: impl Display) -> IndexError {
    IndexError::Sitemap(err.to_string())
}

/// Serialize `entries` as a sitemaps.org 0.9 document.
pub fn write_sitemap(entries: &[SitemapEntry]) -> Result<Vec<u8>, IndexError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Start(BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS)])))
        .map_err(xml_error)?;

    for entry in entries {
        let lastmod = entry.lastmod_w3c();
        writer.write_event(Event::Start(BytesStart::new("url"))).map_err(xml_error)?;
        for (name, value) in [
            ("loc", entry.loc.as_str()),
            ("lastmod", lastmod.as_str()),
            ("changefreq", CHANGE_FREQUENCY),
        ] {
            writer.write_event(Event::Start(BytesStart::new(name))).map_err(xml_error)?;
            writer.write_event(Event::Text(BytesText::new(value))).map_err(xml_error)?;
            writer.write_event(Event::End(BytesEnd::new(name))).map_err(xml_error)?;
        }
        writer.write_event(Event::End(BytesEnd::new("url"))).map_err(xml_error)?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset"))).map_err(xml_error)?;
    let mut xml = writer.into_inner();
    xml.push(b'\n');
    Ok(xml)
}
