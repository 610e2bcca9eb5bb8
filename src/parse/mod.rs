//! Link normalization and classification
//!
//! This module handles:
//! - Resolving hrefs against the page they appear on
//! - Stripping fragments and queries so URLs compare by identity
//! - Classifying targets as pages, images or archives by extension
//! - Content type checks for fetched documents

mod html;

pub use html::*;

use url::Url;

/// Content types whose bodies are scanned for links
const MARKUP_CONTENT_TYPES: &[&str] = &["text/html", "text/plain", "application/xhtml+xml"];

/// What a link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// An HTML document to crawl
    Page,
    /// A crest image (.png)
    Image,
    /// A league pack (.zip)
    Archive,
}

/// Extensions that are never crawled as pages
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "zip", "svg", "pdf", "jpg", "jpeg", "gif", "webp", "ico",
];

/// Check whether a declared content type is one we scan for links
pub fn is_markup_content_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let lower = content_type.trim().to_ascii_lowercase();
    MARKUP_CONTENT_TYPES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// Drop the parts of a URL that don't affect which resource it names
fn strip_url(mut url: Url) -> Option<Url> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    url.set_query(None);
    Some(url)
}

/// Resolve an href found on `base` into a normalized absolute URL
///
/// Returns `None` for hrefs that can't be joined or that use a scheme
/// other than http(s) (`mailto:`, `javascript:` and friends).
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let joined = base.join(href.trim()).ok()?;
    strip_url(joined)
}

/// Normalize an absolute URL string for deduplication
pub fn normalize_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    strip_url(parsed).map(|u| u.to_string())
}

/// Lowercased extension of the URL's last path segment, if it carries one
pub fn url_extension(url: &Url) -> Option<String> {
    let last = url.path().rsplit('/').next()?;
    let (stem, ext) = last.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Check whether a URL names a known binary file type
pub fn is_binary_url(url: &Url) -> bool {
    url_extension(url).is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.as_str()))
}

/// Classify a normalized URL
///
/// Images and (optionally) archives are assets. Any other binary type is
/// dropped. Everything else, including directory-like URLs, is a page
/// candidate.
pub fn classify_link(url: &Url, collect_archives: bool) -> Option<LinkKind> {
    match url_extension(url).as_deref() {
        Some("png") => Some(LinkKind::Image),
        Some("zip") if collect_archives => Some(LinkKind::Archive),
        _ if is_binary_url(url) => None,
        _ => Some(LinkKind::Page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_resolve_relative_parent_link() {
        let base = url("https://site/escudoteca/x/y/index.html");
        let resolved = resolve_link(&base, "../other/page.html").unwrap();
        assert_eq!(resolved.as_str(), "https://site/escudoteca/x/other/page.html");
    }

    #[test]
    fn test_resolve_strips_fragment_and_query() {
        let base = url("https://site/escudoteca/index.html");
        let resolved = resolve_link(&base, "argentina/index.html?lang=es#top").unwrap();
        assert_eq!(
            resolved.as_str(),
            "https://site/escudoteca/argentina/index.html"
        );
    }

    #[test]
    fn test_resolve_rejects_other_schemes() {
        let base = url("https://site/escudoteca/index.html");
        assert!(resolve_link(&base, "mailto:someone@site").is_none());
        assert!(resolve_link(&base, "javascript:void(0)").is_none());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "https://site/escudoteca/a/b/../c.html?x=1#frag",
            "https://SITE/escudoteca/",
            "http://site:8080/escudoteca/argentina/png/boca%20juniors.png",
            "https://site",
        ];
        for sample in samples {
            let once = normalize_url(sample).unwrap();
            let twice = normalize_url(&once).unwrap();
            assert_eq!(once, twice, "normalizing {} twice changed it", sample);
        }
    }

    #[test]
    fn test_classify_link() {
        let png = url("https://site/escudoteca/arg/primera/png/boca.PNG");
        let zip = url("https://site/escudoteca/arg/primera/pack.zip");
        let svg = url("https://site/escudoteca/arg/primera/svg/boca.svg");
        let dir = url("https://site/escudoteca/arg/primera/");
        let bare = url("https://site/escudoteca/arg/primera");
        let page = url("https://site/escudoteca/arg/index.html");

        assert_eq!(classify_link(&png, false), Some(LinkKind::Image));
        assert_eq!(classify_link(&zip, true), Some(LinkKind::Archive));
        assert_eq!(classify_link(&zip, false), None);
        assert_eq!(classify_link(&svg, true), None);
        assert_eq!(classify_link(&dir, false), Some(LinkKind::Page));
        assert_eq!(classify_link(&bare, false), Some(LinkKind::Page));
        assert_eq!(classify_link(&page, false), Some(LinkKind::Page));
    }

    #[test]
    fn test_markup_content_types() {
        assert!(is_markup_content_type(Some("text/html; charset=utf-8")));
        assert!(is_markup_content_type(Some("TEXT/PLAIN")));
        assert!(is_markup_content_type(Some("application/xhtml+xml")));
        assert!(!is_markup_content_type(Some("image/png")));
        assert!(!is_markup_content_type(None));
    }
}
