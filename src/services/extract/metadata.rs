// src/services/extract/metadata.rs

//! Primary extraction strategy.
//!
//! Reads article metadata from meta tags, JSON-LD, and common news/blog CMS
//! markup, and picks the main content block either from known content
//! containers or from the element holding the most paragraph text.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

use super::{ExtractionStrategy, PartialArticle};
use crate::error::Result;
use crate::utils::http::Fetcher;
use crate::utils::markdown::element_text;
use crate::utils::resolve_url;

const TITLE_SELECTORS: &[&str] = &["h1.entry-title", "h1.post-title", ".entry-header h1", "h1"];

const CONTENT_SELECTORS: &[&str] = &[
    ".entry-content",
    ".post-content",
    ".single-post-content",
    "[itemprop='articleBody']",
    ".article-body",
    "article",
    ".content",
];

const IMAGE_SELECTORS: &[&str] = &[
    ".entry-thumbnail img",
    ".post-thumbnail img",
    ".featured-image img",
    ".wp-post-image",
];

const AUTHOR_SELECTORS: &[&str] = &[
    ".entry-author",
    ".post-author",
    ".author-name",
    ".by-author",
    "a[rel='author']",
];

const DATE_META_SELECTORS: &[&str] = &[
    "meta[property='article:published_time']",
    "meta[itemprop='datePublished']",
    "meta[name='pubdate']",
    "meta[name='date']",
];

/// Paragraphs shorter than this do not count toward a content block.
const MIN_PARAGRAPH_CHARS: usize = 25;

/// Metadata-driven extraction, tuned for typical article pages.
pub struct MetadataStrategy {
    fetcher: Arc<dyn Fetcher>,
}

impl MetadataStrategy {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExtractionStrategy for MetadataStrategy {
    fn name(&self) -> &'static str {
        "metadata"
    }

    async fn extract(&self, url: &str) -> Result<Option<PartialArticle>> {
        let html = self.fetcher.fetch(url).await?;
        Ok(Some(parse_page(&html, url)))
    }
}

/// Extract every field the page exposes.
pub fn parse_page(html: &str, url: &str) -> PartialArticle {
    let document = Html::parse_document(html);
    let base = Url::parse(url).ok();
    let json_ld = json_ld_objects(&document);

    let content = content_block(&document);
    let (content_html, text) = match content {
        Some(block) => (Some(block.inner_html()), element_text(block)),
        None => (None, String::new()),
    };

    PartialArticle {
        title: title(&document),
        content_html,
        text,
        top_image: top_image(&document).map(|src| match &base {
            Some(base) => resolve_url(base, &src),
            None => src,
        }),
        authors: authors(&document, &json_ld),
        publish_date: publish_date(&document, &json_ld),
        keywords: keywords(&document),
        page_html: html.to_string(),
    }
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    select_first(document, selector)
        .and_then(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn title(document: &Html) -> Option<String> {
    meta_content(document, "meta[property='og:title']").or_else(|| {
        TITLE_SELECTORS.iter().find_map(|sel| {
            select_first(document, sel)
                .map(element_text)
                .filter(|t| !t.is_empty())
        })
    })
}

fn content_block(document: &Html) -> Option<ElementRef<'_>> {
    let known = CONTENT_SELECTORS.iter().find_map(|sel| {
        select_first(document, sel).filter(|el| !element_text(*el).is_empty())
    });
    known.or_else(|| densest_paragraph_parent(document))
}

/// The element whose direct paragraph children hold the most text.
fn densest_paragraph_parent(document: &Html) -> Option<ElementRef<'_>> {
    let paragraph = Selector::parse("p").ok()?;
    let mut scores: Vec<(ElementRef, usize)> = Vec::new();

    for p in document.select(&paragraph) {
        let len = element_text(p).chars().count();
        if len < MIN_PARAGRAPH_CHARS {
            continue;
        }
        let Some(parent) = p.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        match scores.iter_mut().find(|(el, _)| el.id() == parent.id()) {
            Some((_, score)) => *score += len,
            None => scores.push((parent, len)),
        }
    }

    scores
        .into_iter()
        .max_by_key(|(_, score)| *score)
        .map(|(el, _)| el)
}

fn top_image(document: &Html) -> Option<String> {
    meta_content(document, "meta[property='og:image']").or_else(|| {
        IMAGE_SELECTORS.iter().find_map(|sel| {
            select_first(document, sel)
                .and_then(|img| img.value().attr("src"))
                .map(str::trim)
                .filter(|src| !src.is_empty())
                .map(str::to_string)
        })
    })
}

fn authors(document: &Html, json_ld: &[Value]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        let name = name.trim();
        if !name.is_empty() && !found.iter().any(|n| n == name) {
            found.push(name.to_string());
        }
    };

    if let Some(name) = meta_content(document, "meta[name='author']") {
        push(&name);
    }
    for object in json_ld {
        match object.get("author") {
            Some(Value::Array(list)) => list
                .iter()
                .filter_map(json_ld_name)
                .for_each(|n| push(n)),
            Some(author) => {
                if let Some(n) = json_ld_name(author) {
                    push(n);
                }
            }
            None => {}
        }
    }
    for sel in AUTHOR_SELECTORS {
        if let Some(el) = select_first(document, sel) {
            push(&element_text(el));
        }
    }
    found
}

fn json_ld_name(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(obj) => obj.get("name").and_then(Value::as_str),
        _ => None,
    }
}

fn publish_date(document: &Html, json_ld: &[Value]) -> Option<DateTime<Utc>> {
    DATE_META_SELECTORS
        .iter()
        .filter_map(|sel| meta_content(document, sel))
        .chain(
            json_ld
                .iter()
                .filter_map(|o| o.get("datePublished").and_then(Value::as_str))
                .map(str::to_string),
        )
        .chain(
            select_first(document, "time[datetime]")
                .and_then(|el| el.value().attr("datetime"))
                .map(str::to_string),
        )
        .find_map(|raw| parse_date(&raw))
}

/// Parse the date formats news sites put in metadata.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn keywords(document: &Html) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut push = |kw: &str| {
        let kw = kw.trim();
        if !kw.is_empty() && !found.iter().any(|k| k == kw) {
            found.push(kw.to_string());
        }
    };

    for sel in ["meta[name='keywords']", "meta[name='news_keywords']"] {
        if let Some(list) = meta_content(document, sel) {
            list.split(',').for_each(&mut push);
        }
    }
    if let Ok(tag) = Selector::parse("meta[property='article:tag']") {
        for el in document.select(&tag) {
            if let Some(content) = el.value().attr("content") {
                push(content);
            }
        }
    }
    found
}

/// Every JSON-LD object on the page, with `@graph` members flattened.
fn json_ld_objects(document: &Html) -> Vec<Value> {
    let Ok(script) = Selector::parse("script[type='application/ld+json']") else {
        return Vec::new();
    };

    let mut objects = Vec::new();
    for el in document.select(&script) {
        let raw: String = el.text().collect();
        let Ok(value) = serde_json::from_str::<Value>(raw.trim()) else {
            continue;
        };
        flatten_json_ld(value, &mut objects);
    }
    objects
}

fn flatten_json_ld(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|v| flatten_json_ld(v, out)),
        Value::Object(mut obj) => {
            if let Some(graph) = obj.remove("@graph") {
                flatten_json_ld(graph, out);
            }
            out.push(Value::Object(obj));
        }
        _ => {}
    }
}
