//! URL normalization, same-site checks and link extraction.

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::error::{ResearchError, Result};

/// Extensions that never lead to an HTML page.
const NON_HTML_EXTENSIONS: &[&str] = &[
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "csv", "txt", "rtf",
    // images
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "bmp", "tif", "tiff", "avif",
    // assets
    "css", "js", "mjs", "map", "woff", "woff2", "ttf", "eot",
    // archives
    "zip", "gz", "tgz", "tar", "rar", "7z", "dmg", "exe", "msi",
    // media
    "mp3", "mp4", "m4a", "wav", "ogg", "webm", "mov", "avi",
    // feeds and data
    "xml", "rss", "atom", "json",
];

/// Parse a user-supplied website, accepting bare domains.
///
/// `acme.com` becomes `https://acme.com/`.
pub fn parse_website(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|_| ResearchError::InvalidUrl {
        url: input.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ResearchError::InvalidUrl {
            url: input.to_string(),
        });
    }
    Ok(url)
}

/// Normalize an absolute URL for deduplication.
///
/// Lowercases scheme and host, drops default ports, the fragment and the
/// query, and removes a trailing slash from non-root paths. Returns `None`
/// for unparseable URLs and non-http(s) schemes.
pub fn normalize_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    normalize(&url)
}

fn normalize(url: &Url) -> Option<String> {
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }

    let mut url = url.clone();
    url.set_fragment(None);
    url.set_query(None);

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Some(url.to_string())
}

/// Resolve an href against the page it appeared on and normalize it.
pub fn resolve_link(page_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let joined = page_url.join(href).ok()?;
    normalize(&joined)
}

/// Host with a leading `www.` removed, lowercased.
pub fn site_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// True when both URLs are on the same site, ignoring `www.`.
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (site_host(a), site_host(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// False for URLs whose last path segment has a known non-HTML extension.
pub fn is_html_resource(url: &Url) -> bool {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    match last.rsplit_once('.') {
        Some((_, ext)) => !NON_HTML_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => true,
    }
}

/// The candidate form of a normalized URL for `base`, or `None` when it is
/// off-site or not HTML.
///
/// Same-site URLs take the base URL's host, so `www.acme.com/about` and
/// `acme.com/about` share one dedupe key.
pub fn candidate_url(url: &str, base: &Url) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    if !same_site(&parsed, base) || !is_html_resource(&parsed) {
        return None;
    }
    if parsed.host_str() != base.host_str() {
        parsed.set_host(base.host_str()).ok()?;
    }
    normalize(&parsed)
}

/// Extract normalized `<a href>` targets from a page, in document order,
/// without duplicates.
pub fn extract_links(html: &str, page_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    // <base href> changes how relative links resolve
    let base = Selector::parse("base[href]")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| page_url.join(href).ok())
        .unwrap_or_else(|| page_url.clone());

    let mut seen = HashSet::new();
    document
        .select(&anchor)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| resolve_link(&base, href))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
