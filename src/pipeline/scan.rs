// src/pipeline/scan.rs

//! Section scan orchestrator.
//!
//! Drives link discovery, the known-URL check, extraction, classification,
//! and persistence across every active section.

use std::sync::Arc;
use std::time::Duration;

use super::schedule::Shutdown;
use crate::error::Result;
use crate::models::{Article, Config, Section};
use crate::services::{ArticleFilter, ExtractionEngine, LinkDiscovery};
use crate::storage::{FingerprintStore, InsertOutcome};
use crate::utils::http::Fetcher;

/// Number of links a dry run reports.
pub const TEST_LINK_LIMIT: usize = 10;

/// Summary of one scan pass.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Newly persisted articles, in section then link order
    pub articles: Vec<Article>,
    pub sections_scanned: usize,
    pub section_failures: usize,
    pub skipped_known: usize,
    pub extraction_failures: usize,
    pub filtered: usize,
    pub duplicates: usize,
    /// Batches the sink failed to take; their articles stay persisted
    pub delivery_failures: usize,
}

/// Service for scanning monitored sections.
pub struct SectionScanner {
    store: Arc<dyn FingerprintStore>,
    fetcher: Arc<dyn Fetcher>,
    links: LinkDiscovery,
    engine: ExtractionEngine,
    filter: ArticleFilter,
    request_delay: Duration,
}

impl SectionScanner {
    /// Create a scanner with the default extraction chain.
    pub fn new(config: &Config, fetcher: Arc<dyn Fetcher>, store: Arc<dyn FingerprintStore>) -> Self {
        let engine = ExtractionEngine::new(Arc::clone(&fetcher), &config.publishing);
        Self::with_engine(config, fetcher, store, engine)
    }

    /// Create a scanner with a custom extraction engine.
    pub fn with_engine(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn FingerprintStore>,
        engine: ExtractionEngine,
    ) -> Self {
        Self {
            store,
            fetcher,
            links: LinkDiscovery::new(&config.website.base_url),
            engine,
            filter: ArticleFilter::new(&config.filter),
            request_delay: Duration::from_millis(config.crawler.request_delay_ms),
        }
    }

    /// Scan every active section once.
    ///
    /// Section failures are logged and counted; only store failures while
    /// listing sections fail the pass. Stops between sections on shutdown.
    pub async fn scan_all(&self, shutdown: &Shutdown) -> Result<ScanOutcome> {
        let sections = self.store.list_sections(true).await?;
        let mut outcome = ScanOutcome::default();

        for section in &sections {
            if shutdown.is_triggered() {
                log::info!("Shutdown requested, stopping before section {}", section.name);
                break;
            }

            log::info!("Scanning section {} ({})", section.name, section.url);
            let before = outcome.articles.len();
            match self.scan_section(section, &mut outcome).await {
                Ok(()) => log::info!(
                    "Section {}: {} new article(s)",
                    section.name,
                    outcome.articles.len() - before
                ),
                Err(e) => {
                    outcome.section_failures += 1;
                    log::error!("Section {} failed: {}", section.name, e);
                }
            }
            outcome.sections_scanned += 1;

            if let Err(e) = self.store.touch_last_checked(section.id).await {
                log::error!("Could not record check time for {}: {}", section.name, e);
            }
        }

        log::info!(
            "Scanned {} section(s): {} new, {} known, {} filtered, {} extraction failure(s), {} section failure(s)",
            outcome.sections_scanned,
            outcome.articles.len(),
            outcome.skipped_known,
            outcome.filtered,
            outcome.extraction_failures,
            outcome.section_failures
        );
        Ok(outcome)
    }

    /// Scan one section, appending new articles to `outcome`.
    async fn scan_section(&self, section: &Section, outcome: &mut ScanOutcome) -> Result<()> {
        let html = self.fetcher.fetch(&section.url).await?;
        let links = self.links.discover(&html, &section.url, &section.selector)?;
        log::debug!("Section {}: {} candidate link(s)", section.name, links.len());

        let mut fetched_any = false;
        for link in links {
            if self.store.exists_by_url(&link).await? {
                log::debug!("Skipping known article {}", link);
                outcome.skipped_known += 1;
                continue;
            }

            if fetched_any && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
            fetched_any = true;

            let mut article = match self.engine.extract(&link, &section.name).await {
                Ok(article) => article,
                Err(e) => {
                    log::warn!("{}", e);
                    outcome.extraction_failures += 1;
                    continue;
                }
            };

            if !self.filter.classify(&mut article, &section.settings) {
                log::debug!("Filtered out {}", link);
                outcome.filtered += 1;
                continue;
            }

            match self.store.insert(&article).await? {
                InsertOutcome::Inserted(id) => {
                    article.id = Some(id);
                    outcome.articles.push(article);
                }
                InsertOutcome::Duplicate(key) => {
                    log::debug!("Duplicate {:?} for {}", key, link);
                    outcome.duplicates += 1;
                }
            }
        }
        Ok(())
    }

    /// Dry run: the first discovered links of a listing page.
    ///
    /// Nothing is persisted and known articles are not skipped.
    pub async fn test_section(&self, url: &str, selector: &str) -> Result<Vec<String>> {
        let html = self.fetcher.fetch(url).await?;
        let mut links = self.links.discover(&html, url, selector)?;
        links.truncate(TEST_LINK_LIMIT);
        Ok(links)
    }
}
