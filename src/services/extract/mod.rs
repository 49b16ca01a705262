// src/services/extract/mod.rs

//! Article extraction engine.
//!
//! Runs an ordered chain of extraction strategies against an article URL.
//! The first strategy that yields body text supplies the body; metadata
//! (title, image, authors, date, keywords) is taken from the earliest
//! strategy that reported it, then from page lookups, then from defaults.

mod metadata;
mod page;
mod readable;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{Article, PublishingConfig};
use crate::utils::http::Fetcher;
use crate::utils::markdown::{html_to_markdown, paragraphs_to_markdown};
use crate::utils::text::{summarize, title_from_url};

pub use metadata::MetadataStrategy;
pub use page::{page_image, page_title};
pub use readable::ReadabilityStrategy;

/// What a single strategy recovered from an article page.
#[derive(Debug, Clone, Default)]
pub struct PartialArticle {
    pub title: Option<String>,
    /// HTML of the main content block, when the strategy isolated one
    pub content_html: Option<String>,
    /// Plain body text
    pub text: String,
    pub top_image: Option<String>,
    pub authors: Vec<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub keywords: Vec<String>,
    /// Raw page the strategy worked on
    pub page_html: String,
}

impl PartialArticle {
    /// Whether the strategy found any body text.
    pub fn has_body(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// One way of turning an article URL into article fields.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Extract what the strategy can from `url`.
    ///
    /// `Ok(None)` means the strategy had nothing to offer; errors abort the
    /// whole extraction.
    async fn extract(&self, url: &str) -> Result<Option<PartialArticle>>;
}

/// Builds normalized `Article` records from article URLs.
pub struct ExtractionEngine {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    summary_max_length: usize,
    auto_publish: bool,
}

impl ExtractionEngine {
    /// Create an engine with the default chain: metadata heuristics, then readability.
    pub fn new(fetcher: Arc<dyn Fetcher>, publishing: &PublishingConfig) -> Self {
        Self::with_strategies(
            vec![
                Box::new(MetadataStrategy::new(Arc::clone(&fetcher))),
                Box::new(ReadabilityStrategy::new(fetcher)),
            ],
            publishing,
        )
    }

    /// Create an engine with a custom strategy chain.
    pub fn with_strategies(
        strategies: Vec<Box<dyn ExtractionStrategy>>,
        publishing: &PublishingConfig,
    ) -> Self {
        Self {
            strategies,
            summary_max_length: publishing.summary_max_length,
            auto_publish: publishing.auto_publish,
        }
    }

    /// Extract an article for `url`, owned by the section named `section`.
    pub async fn extract(&self, url: &str, section: &str) -> Result<Article> {
        let mut partials: Vec<PartialArticle> = Vec::new();
        let mut chosen = None;

        for strategy in &self.strategies {
            match strategy.extract(url).await? {
                Some(partial) => {
                    let has_body = partial.has_body();
                    partials.push(partial);
                    if has_body {
                        log::debug!("{} extracted body for {}", strategy.name(), url);
                        chosen = Some(partials.len() - 1);
                        break;
                    }
                    log::debug!("{} found no body text for {}", strategy.name(), url);
                }
                None => log::debug!("{} had nothing for {}", strategy.name(), url),
            }
        }

        let Some(index) = chosen else {
            return Err(AppError::extraction(url, "no readable content"));
        };
        Ok(self.assemble(url, section, &partials, index))
    }

    fn assemble(
        &self,
        url: &str,
        section: &str,
        partials: &[PartialArticle],
        chosen: usize,
    ) -> Article {
        let source = &partials[chosen];

        let body = source
            .content_html
            .as_deref()
            .and_then(html_to_markdown)
            .filter(|md| !md.trim().is_empty())
            .unwrap_or_else(|| paragraphs_to_markdown(&source.text));

        let title = partials
            .iter()
            .find_map(|p| p.title.clone().filter(|t| !t.trim().is_empty()))
            .or_else(|| page_title(&source.page_html))
            .unwrap_or_else(|| title_from_url(url));

        let image_url = partials
            .iter()
            .find_map(|p| p.top_image.clone())
            .or_else(|| page_image(&source.page_html, url))
            .unwrap_or_default();

        let author = partials
            .iter()
            .flat_map(|p| p.authors.iter())
            .find(|a| !a.trim().is_empty())
            .cloned()
            .unwrap_or_default();

        let now = Utc::now();
        let publish_date = partials
            .iter()
            .find_map(|p| p.publish_date)
            .unwrap_or(now);

        let tags = partials
            .iter()
            .find(|p| !p.keywords.is_empty())
            .map(|p| p.keywords.clone())
            .unwrap_or_default();

        let content_hash = Article::fingerprint(url, &title, &body);

        Article {
            id: None,
            url: url.to_string(),
            title,
            summary: summarize(&source.text, self.summary_max_length),
            body,
            author,
            publish_date,
            section: section.to_string(),
            image_url,
            tags,
            content_hash,
            approval_required: !self.auto_publish,
            published: false,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http::testing::StaticFetcher;

    const URL: &str = "https://site.test/archives/my-great-article";

    fn publishing(auto_publish: bool) -> PublishingConfig {
        PublishingConfig {
            auto_publish,
            summary_max_length: 200,
        }
    }

    struct Fixed(Option<PartialArticle>);

    #[async_trait]
    impl ExtractionStrategy for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn extract(&self, _url: &str) -> Result<Option<PartialArticle>> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl ExtractionStrategy for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn extract(&self, url: &str) -> Result<Option<PartialArticle>> {
            Err(AppError::fetch(url, "timed out"))
        }
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_has_no_body() {
        let primary = PartialArticle {
            title: Some("Primary Title".into()),
            authors: vec!["Desk".into()],
            keywords: vec!["politics".into()],
            ..Default::default()
        };
        let fallback = PartialArticle {
            title: Some("Fallback Title".into()),
            content_html: Some("<p>Body from fallback.</p>".into()),
            text: "Body from fallback.".into(),
            ..Default::default()
        };
        let engine = ExtractionEngine::with_strategies(
            vec![Box::new(Fixed(Some(primary))), Box::new(Fixed(Some(fallback)))],
            &publishing(false),
        );

        let article = engine.extract(URL, "news").await.unwrap();
        assert_eq!(article.title, "Primary Title");
        assert_eq!(article.body, "Body from fallback.");
        assert_eq!(article.author, "Desk");
        assert_eq!(article.tags, vec!["politics"]);
        assert_eq!(article.section, "news");
        assert!(article.approval_required);
        assert_eq!(
            article.content_hash,
            Article::fingerprint(URL, "Primary Title", "Body from fallback.")
        );
    }

    #[tokio::test]
    async fn test_default_chain_uses_readability_when_metadata_finds_no_body() {
        let html = r#"<html><head><title>Water rationing begins</title></head><body>
            <div id="story">
              <div>Water rationing began on Monday in the northern districts, with supply cut to four days a week.</div>
              <div>The utility said reservoirs were at their lowest level in a decade, and asked residents to store water.</div>
              <div>Farmers in the valley, who rely on the same wells, were told to expect further limits next month.</div>
            </div>
        </body></html>"#;
        let fetcher = Arc::new(StaticFetcher::new().with_page(URL, html));
        let engine = ExtractionEngine::new(fetcher.clone(), &publishing(false));

        let article = engine.extract(URL, "news").await.unwrap();
        assert_eq!(article.title, "Water rationing begins");
        assert!(article.body.contains("lowest level in a decade"));
        assert!(article.summary.contains("Water rationing began on Monday"));
        assert_eq!(fetcher.request_count(URL), 2);
    }

    #[tokio::test]
    async fn test_no_body_anywhere_is_an_error() {
        let engine = ExtractionEngine::with_strategies(
            vec![Box::new(Fixed(None)), Box::new(Fixed(Some(PartialArticle::default())))],
            &publishing(true),
        );
        let err = engine.extract(URL, "news").await.unwrap_err();
        assert!(matches!(err, AppError::Extraction { .. }));
    }

    #[tokio::test]
    async fn test_strategy_error_aborts() {
        let engine = ExtractionEngine::with_strategies(
            vec![
                Box::new(Failing),
                Box::new(Fixed(Some(PartialArticle {
                    text: "never used".into(),
                    ..Default::default()
                }))),
            ],
            &publishing(true),
        );
        assert!(matches!(
            engine.extract(URL, "news").await,
            Err(AppError::Fetch { .. })
        ));
    }

    #[tokio::test]
    async fn test_title_falls_back_to_url_slug() {
        let html = r#"<html><body><div class="entry-content">
            <p>Plenty of body text for this article without any heading at all.</p>
        </div></body></html>"#;
        let fetcher = Arc::new(StaticFetcher::new().with_page(URL, html));
        let engine = ExtractionEngine::new(fetcher, &publishing(true));

        let article = engine.extract(URL, "news").await.unwrap();
        assert_eq!(article.title, "My Great Article");
        assert!(!article.approval_required);
        assert_eq!(article.image_url, "");
        assert_eq!(article.author, "");
    }

    #[tokio::test]
    async fn test_defaults_publish_date_to_now() {
        let before = Utc::now();
        let engine = ExtractionEngine::with_strategies(
            vec![Box::new(Fixed(Some(PartialArticle {
                text: "Some text.".into(),
                ..Default::default()
            })))],
            &publishing(false),
        );
        let article = engine.extract(URL, "news").await.unwrap();
        assert!(article.publish_date >= before);
        assert_eq!(article.body, "Some text.");
        assert_eq!(article.summary, "Some text.");
    }

    #[tokio::test]
    async fn test_image_from_page_meta() {
        let html = r#"<html><head>
            <meta name="twitter:image" content="/img/lead.jpg">
          </head><body><p>Text</p></body></html>"#;
        let engine = ExtractionEngine::with_strategies(
            vec![Box::new(Fixed(Some(PartialArticle {
                text: "Text".into(),
                page_html: html.into(),
                ..Default::default()
            })))],
            &publishing(false),
        );
        let article = engine.extract(URL, "news").await.unwrap();
        assert_eq!(article.image_url, "https://site.test/img/lead.jpg");
    }
}
