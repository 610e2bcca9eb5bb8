//! HTML link extraction

use super::{classify_link, is_markup_content_type, resolve_link, LinkKind};
use crate::crawl::Scope;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// In-scope link targets found on one page, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub pages: Vec<Url>,
    pub images: Vec<Url>,
    pub archives: Vec<Url>,
}

impl PageLinks {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.images.is_empty() && self.archives.is_empty()
    }

    fn push(&mut self, kind: LinkKind, url: Url) {
        match kind {
            LinkKind::Page => self.pages.push(url),
            LinkKind::Image => self.images.push(url),
            LinkKind::Archive => self.archives.push(url),
        }
    }
}

/// Every `<a href>` on the page, resolved and normalized, duplicates removed
pub fn extract_hrefs(content: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(content);
    let mut seen: HashSet<String> = HashSet::new();
    let mut urls = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for elem in document.select(&selector) {
            let Some(href) = elem.value().attr("href") else {
                continue;
            };
            if let Some(url) = resolve_link(base_url, href) {
                if seen.insert(url.as_str().to_string()) {
                    urls.push(url);
                }
            }
        }
    }

    urls
}

/// Extract the in-scope links of a fetched document
///
/// Documents whose content type is not textual/HTML yield nothing.
pub fn extract_links(
    base_url: &Url,
    content_type: Option<&str>,
    content: &str,
    scope: &Scope,
    collect_archives: bool,
) -> PageLinks {
    let mut links = PageLinks::default();
    if !is_markup_content_type(content_type) {
        return links;
    }

    for url in extract_hrefs(content, base_url) {
        if !scope.in_scope(&url) {
            continue;
        }
        if let Some(kind) = classify_link(&url, collect_archives) {
            links.push(kind, url);
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
    <html>
    <head><title>Argentina</title></head>
    <body>
        <a href="primeradivision/index.html">Primera</a>
        <a href="primeradivision/index.html#clubs">Primera again</a>
        <a href="primeradivision/png/boca_juniors.png">Boca</a>
        <a href="primeradivision/primeradivision.zip">Pack</a>
        <a href="primeradivision/svg/boca_juniors.svg">Boca SVG</a>
        <a href="../../contacto.html">Contact</a>
        <a href="https://elsewhere.net/escudoteca/uruguay/index.html">Mirror</a>
        <a href="mailto:admin@site">Mail</a>
        <a>No target</a>
    </body>
    </html>
    "#;

    fn scope() -> Scope {
        let start = Url::parse("https://site/escudoteca/index.html").unwrap();
        Scope::site(&start, "escudoteca")
    }

    fn base() -> Url {
        Url::parse("https://site/escudoteca/argentina/index.html").unwrap()
    }

    #[test]
    fn test_extract_hrefs_dedupes_after_normalizing() {
        let hrefs = extract_hrefs(PAGE, &base());
        let primera = hrefs
            .iter()
            .filter(|u| u.path() == "/escudoteca/argentina/primeradivision/index.html")
            .count();
        assert_eq!(primera, 1);
        assert!(hrefs.iter().all(|u| u.scheme() == "https"));
    }

    #[test]
    fn test_extract_links_classifies_in_scope_targets() {
        let links = extract_links(&base(), Some("text/html"), PAGE, &scope(), false);

        assert_eq!(
            links.pages,
            vec![Url::parse("https://site/escudoteca/argentina/primeradivision/index.html").unwrap()]
        );
        assert_eq!(
            links.images,
            vec![Url::parse(
                "https://site/escudoteca/argentina/primeradivision/png/boca_juniors.png"
            )
            .unwrap()]
        );
        assert!(links.archives.is_empty());
    }

    #[test]
    fn test_extract_links_collects_archives_when_enabled() {
        let links = extract_links(&base(), Some("text/html"), PAGE, &scope(), true);
        assert_eq!(links.archives.len(), 1);
        assert!(links.archives[0].path().ends_with("primeradivision.zip"));
    }

    #[test]
    fn test_non_html_yields_nothing() {
        let links = extract_links(&base(), Some("image/png"), PAGE, &scope(), true);
        assert!(links.is_empty());

        let links = extract_links(&base(), None, PAGE, &scope(), true);
        assert!(links.is_empty());
    }

    #[test]
    fn test_parent_link_leaving_root_is_filtered() {
        let page = Url::parse("https://site/escudoteca/x/y/index.html").unwrap();
        let html = r#"<a href="../other/page.html">in</a><a href="../../../other/page.html">out</a>"#;
        let links = extract_links(&page, Some("text/html"), html, &scope(), false);
        assert_eq!(
            links.pages,
            vec![Url::parse("https://site/escudoteca/x/other/page.html").unwrap()]
        );
    }
}
