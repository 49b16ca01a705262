// src/services/extract/page.rs

//! Last-resort lookups for a title and a lead image on the raw article page.

use scraper::{Html, Selector};
use url::Url;

use crate::utils::markdown::element_text;
use crate::utils::resolve_url;

const TITLE_SELECTORS: &[&str] = &["h1", "title", ".entry-title", ".post-title", ".article-title"];

const IMAGE_SELECTORS: &[&str] = &[
    "meta[property='og:image']",
    "meta[name='twitter:image']",
    ".featured-image img",
    ".post-thumbnail img",
    ".entry-content img:first-child",
    "img[src*='featured']",
];

/// First non-empty title-like element on the page.
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    TITLE_SELECTORS.iter().find_map(|sel| {
        let selector = Selector::parse(sel).ok()?;
        document
            .select(&selector)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

/// First lead-image candidate on the page, absolute against `page_url`.
pub fn page_image(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    let found = IMAGE_SELECTORS.iter().find_map(|sel| {
        let selector = Selector::parse(sel).ok()?;
        document.select(&selector).find_map(|el| {
            let attr = if el.value().name() == "meta" { "content" } else { "src" };
            el.value()
                .attr(attr)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
    })?;

    Some(match base {
        Some(base) => resolve_url(&base, &found),
        None => found,
    })
}
