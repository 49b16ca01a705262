// src/services/extract/readable.rs

//! Fallback strategy backed by the `readability` crate.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::{ExtractionStrategy, PartialArticle};
use crate::error::{AppError, Result};
use crate::utils::http::Fetcher;

/// Generic readable-content extraction for pages the metadata heuristics miss.
pub struct ReadabilityStrategy {
    fetcher: Arc<dyn Fetcher>,
}

impl ReadabilityStrategy {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExtractionStrategy for ReadabilityStrategy {
    fn name(&self) -> &'static str {
        "readability"
    }

    async fn extract(&self, url: &str) -> Result<Option<PartialArticle>> {
        let html = self.fetcher.fetch(url).await?;
        readable_content(&html, url).map(Some)
    }
}

fn readable_content(html: &str, url: &str) -> Result<PartialArticle> {
    let page_url = Url::parse(url)?;
    let product = readability::extractor::extract(&mut html.as_bytes(), &page_url)
        .map_err(|e| AppError::extraction(url, e))?;

    let title = product.title.trim();
    Ok(PartialArticle {
        title: (!title.is_empty()).then(|| title.to_string()),
        content_html: Some(product.content).filter(|c| !c.trim().is_empty()),
        text: product.text,
        page_html: html.to_string(),
        ..Default::default()
    })
}
