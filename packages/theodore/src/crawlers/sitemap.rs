//! Parse sitemap.xml and sitemap index files.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Contents of one sitemap document.
///
/// A `<urlset>` fills `urls`; a `<sitemapindex>` fills `children`, which the
/// caller fetches in turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    /// Page URLs from `<url><loc>`, in document order
    pub urls: Vec<String>,

    /// Child sitemap URLs from `<sitemap><loc>`
    pub children: Vec<String>,
}

impl SitemapDocument {
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.children.is_empty()
    }
}

/// Parse a sitemap XML string.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = SitemapDocument::default();
    let mut in_url = false;
    let mut in_sitemap = false;
    let mut in_loc = false;
    let mut loc = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"url" => {
                    in_url = true;
                    loc.clear();
                }
                b"sitemap" => {
                    in_sitemap = true;
                    loc.clear();
                }
                b"loc" => in_loc = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"url" if in_url => {
                    if !loc.is_empty() {
                        doc.urls.push(loc.clone());
                    }
                    in_url = false;
                }
                b"sitemap" if in_sitemap => {
                    if !loc.is_empty() {
                        doc.children.push(loc.clone());
                    }
                    in_sitemap = false;
                }
                b"loc" => in_loc = false,
                _ => {}
            },
            Event::Text(e) if in_loc && (in_url || in_sitemap) => {
                loc.push_str(e.unescape()?.trim());
            }
            Event::CData(e) if in_loc && (in_url || in_sitemap) => {
                loc.push_str(String::from_utf8_lossy(&e).trim());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url>
            <loc>https://example.com/</loc>
            <priority>1.0</priority>
          </url>
          <url>
            <loc>https://example.com/about</loc>
            <lastmod>2024-01-15</lastmod>
          </url>
          <url><loc>https://example.com/search?q=a&amp;b=c</loc></url>
        </urlset>"#;

        let doc = parse_sitemap(xml).unwrap();

        assert_eq!(
            doc.urls,
            vec![
                "https://example.com/",
                "https://example.com/about",
                "https://example.com/search?q=a&b=c",
            ]
        );
        assert!(doc.children.is_empty());
    }

    #[test]
    fn test_parse_sitemap_index() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <sitemap><loc>https://example.com/sitemap-pages.xml</loc></sitemap>
          <sitemap><loc>https://example.com/sitemap-posts.xml</loc></sitemap>
        </sitemapindex>"#;

        let doc = parse_sitemap(xml).unwrap();

        assert!(doc.urls.is_empty());
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[0], "https://example.com/sitemap-pages.xml");
    }

    #[test]
    fn test_prefixed_namespace_and_cdata() {
        let xml = r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
          <sm:url><sm:loc><![CDATA[https://example.com/team]]></sm:loc></sm:url>
        </sm:urlset>"#;

        let doc = parse_sitemap(xml).unwrap();
        assert_eq!(doc.urls, vec!["https://example.com/team"]);
    }

    #[test]
    fn test_html_is_not_a_sitemap() {
        let doc = parse_sitemap("<html><body><p>Not found</p></body></html>").unwrap_or_default();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_malformed_xml_errors() {
        assert!(parse_sitemap("<urlset><url><loc>x</url></urlset>").is_err());
    }
}
