// src/services/links.rs

//! Link discovery service.
//!
//! Enumerates candidate article links on a section listing page using the
//! section's CSS selector.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::utils::resolve_link;

/// Path fragments that mark index, media, feed, and admin pages.
pub const DENYLIST: &[&str] = &[
    "/category/",
    "/tag/",
    "/author/",
    "/page/",
    "/search/",
    ".pdf",
    ".doc",
    ".zip",
    ".jpg",
    ".png",
    ".gif",
    "/wp-admin/",
    "/wp-content/",
    "/feed/",
    "/rss/",
];

/// Selector used when a section defines none.
const ALL_ANCHORS: &str = "a[href]";

/// Service for finding article links on listing pages.
#[derive(Debug, Clone)]
pub struct LinkDiscovery {
    site: Option<Url>,
}

impl LinkDiscovery {
    /// Create a discovery service accepting only URLs under `site_url`.
    ///
    /// An unparsable `site_url` rejects every link.
    pub fn new(site_url: &str) -> Self {
        let site = match Url::parse(site_url.trim()) {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("Site URL '{}' is invalid, no link will match: {}", site_url, e);
                None
            }
        };
        Self { site }
    }

    /// Find candidate article URLs on a listing page.
    ///
    /// The result is absolute, deduplicated, and in document order. Persisted
    /// state is never consulted, so already known articles are included.
    pub fn discover(&self, html: &str, base_url: &str, selector: &str) -> Result<Vec<String>> {
        let base = Url::parse(base_url)?;
        let selector_str = if selector.trim().is_empty() {
            ALL_ANCHORS
        } else {
            selector
        };
        let selector = parse_selector(selector_str)?;
        let anchor = parse_selector(ALL_ANCHORS)?;

        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&selector) {
            let Some(href) = Self::element_href(element, &anchor) else {
                continue;
            };
            let Some(url) = resolve_link(&base, href) else {
                continue;
            };
            if !self.is_candidate(&url) {
                log::debug!("Rejected link: {}", url);
                continue;
            }
            if seen.insert(url.to_string()) {
                links.push(url.to_string());
            }
        }

        Ok(links)
    }

    /// Whether a URL can be an article of the monitored site.
    ///
    /// Scheme, host, and port must equal the site's; the path must start
    /// with the site's path.
    pub fn is_candidate(&self, url: &Url) -> bool {
        let Some(site) = &self.site else {
            return false;
        };
        let same_origin = url.scheme() == site.scheme()
            && url.host_str() == site.host_str()
            && url.port_or_known_default() == site.port_or_known_default();
        if !same_origin || !url.path().starts_with(site.path()) {
            return false;
        }
        let path = url.path().to_lowercase();
        !DENYLIST.iter().any(|pattern| path.contains(pattern))
    }

    /// `href` of the element itself, or of its first descendant anchor.
    fn element_href<'a>(element: ElementRef<'a>, anchor: &Selector) -> Option<&'a str> {
        if element.value().name() == "a" {
            return element.value().attr("href");
        }
        element
            .select(anchor)
            .next()
            .and_then(|a| a.value().attr("href"))
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <nav><a href="/archives/category/news">News</a></nav>
          <article><h2 class="entry-title"><a href="/archives/first-story">First</a></h2></article>
          <article><h2 class="entry-title"><a href="https://site.test/archives/second-story#more">Second</a></h2></article>
          <article><h2 class="entry-title"><a href="/archives/first-story">First again</a></h2></article>
          <div class="post-title"><span><a href="/archives/third-story">Third</a></span></div>
          <a href="/archives/tag/yemen">Tag</a>
          <a href="/files/report.PDF">Report</a>
          <a href="https://other.test/archives/elsewhere">External</a>
          <a href="javascript:void(0)">JS</a>
          <a>No href</a>
        </body></html>
    "#;

    fn discovery() -> LinkDiscovery {
        LinkDiscovery::new("https://site.test")
    }

    #[test]
    fn test_selector_matches_in_order_and_dedups() {
        let links = discovery()
            .discover(LISTING, "https://site.test/archives/category/news", "article .entry-title a")
            .unwrap();
        assert_eq!(
            links,
            vec![
                "https://site.test/archives/first-story",
                "https://site.test/archives/second-story",
            ]
        );
    }

    #[test]
    fn test_non_anchor_match_uses_first_descendant_link() {
        let links = discovery()
            .discover(LISTING, "https://site.test/", ".post-title")
            .unwrap();
        assert_eq!(links, vec!["https://site.test/archives/third-story"]);
    }

    #[test]
    fn test_empty_selector_uses_all_anchors_with_denylist() {
        let links = discovery()
            .discover(LISTING, "https://site.test/", "")
            .unwrap();
        assert_eq!(
            links,
            vec![
                "https://site.test/archives/first-story",
                "https://site.test/archives/second-story",
                "https://site.test/archives/third-story",
            ]
        );
    }

    #[test]
    fn test_denylist_is_case_insensitive() {
        let d = discovery();
        for url in [
            "https://site.test/archives/category/news",
            "https://site.test/x/Category/y",
            "https://site.test/report.pdf",
            "https://site.test/wp-content/uploads/a.JPG",
            "https://site.test/feed/",
        ] {
            assert!(!d.is_candidate(&Url::parse(url).unwrap()), "{url}");
        }
        assert!(d.is_candidate(&Url::parse("https://site.test/archives/123").unwrap()));
    }

    #[test]
    fn test_prefix_with_path_is_respected() {
        let d = LinkDiscovery::new("https://site.test/ar/");
        assert!(d.is_candidate(&Url::parse("https://site.test/ar/story").unwrap()));
        assert!(!d.is_candidate(&Url::parse("https://site.test/en/story").unwrap()));
        assert!(!d.is_candidate(&Url::parse("https://site.test.evil.com/ar/story").unwrap()));
    }

    #[test]
    fn test_lookalike_hosts_are_rejected() {
        for base in ["https://site.test/", "https://site.test"] {
            let d = LinkDiscovery::new(base);
            for url in [
                "https://site.test.evil.com/archives/x",
                "https://site.testing/archives/x",
                "http://site.test/archives/x",
                "https://site.test:8443/archives/x",
            ] {
                assert!(!d.is_candidate(&Url::parse(url).unwrap()), "{base} {url}");
            }
            assert!(d.is_candidate(&Url::parse("https://site.test:443/archives/x").unwrap()));
        }
    }

    #[test]
    fn test_invalid_site_url_rejects_everything() {
        let d = LinkDiscovery::new("not a url");
        assert!(!d.is_candidate(&Url::parse("https://site.test/archives/x").unwrap()));
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        assert!(discovery()
            .discover(LISTING, "https://site.test/", "[[invalid")
            .is_err());
    }
}
