//! Visible-text extraction from HTML.

use scraper::{ElementRef, Html, Node, Selector};

/// Subtrees that never hold page content.
const SKIPPED_ELEMENTS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "svg", "iframe", "nav", "header",
    "footer", "aside", "form",
];

/// Elements rendered inline; no word break is added after them.
const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "code", "em", "i", "mark", "small", "span", "strong", "sub", "sup",
    "time", "u",
];

/// Title and visible text of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub title: Option<String>,
    pub text: String,
}

/// Extract the visible text of an HTML document.
///
/// Boilerplate subtrees are removed and whitespace runs collapse to a single
/// space.
pub fn html_to_text(html: &str) -> ExtractedText {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);

    ExtractedText {
        title,
        text: collapse_whitespace(&raw),
    }
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if SKIPPED_ELEMENTS.contains(&child_element.value().name()) {
                continue;
            }
            collect_text(child_element, out);
            if !INLINE_ELEMENTS.contains(&child_element.value().name()) {
                out.push(' ');
            }
        } else if let Node::Text(text) = child.value() {
            out.push_str(text);
        }
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max_chars` characters, cutting at a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_boilerplate() {
        let html = r#"<html>
            <head><title> Acme | About </title><style>body { color: red }</style></head>
            <body>
              <header><a href="/">Logo</a></header>
              <nav><a href="/about">About</a><a href="/team">Team</a></nav>
              <main>
                <h1>About   Acme</h1>
                <p>We build <b>rockets</b>.</p><p>Since 1949.</p>
                <script>var tracking = true;</script>
                <form><input value="Subscribe"></form>
              </main>
              <aside>Related posts</aside>
              <footer>&copy; Acme</footer>
            </body></html>"#;

        let extracted = html_to_text(html);

        assert_eq!(extracted.title.as_deref(), Some("Acme | About"));
        assert_eq!(extracted.text, "About Acme We build rockets. Since 1949.");
    }

    #[test]
    fn test_empty_document() {
        let extracted = html_to_text("<html><body><script>x()</script></body></html>");
        assert!(extracted.text.is_empty());
        assert!(extracted.title.is_none());
    }

    #[test]
    fn test_decodes_entities() {
        let extracted = html_to_text("<p>Smith &amp; Sons&nbsp;Ltd</p>");
        assert_eq!(extracted.text, "Smith & Sons Ltd");
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
