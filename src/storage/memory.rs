//! Process-local fingerprint store.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{FingerprintStore, InsertOutcome, Ledger, StoreStats};
use crate::error::Result;
use crate::models::{Article, Section, SectionSeed};

/// Fingerprint store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ledger: Mutex<Ledger>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with sections.
    pub async fn with_sections(seeds: &[SectionSeed]) -> Self {
        let store = Self::new();
        {
            let mut ledger = store.ledger.lock().await;
            for seed in seeds {
                ledger.add_section(seed);
            }
        }
        store
    }
}

#[async_trait]
impl FingerprintStore for MemoryStore {
    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        Ok(self.ledger.lock().await.exists_by_url(url))
    }

    async fn exists_by_hash(&self, hash: &str) -> Result<bool> {
        Ok(self.ledger.lock().await.exists_by_hash(hash))
    }

    async fn insert(&self, article: &Article) -> Result<InsertOutcome> {
        Ok(self.ledger.lock().await.insert(article))
    }

    async fn get_article_by_url(&self, url: &str) -> Result<Option<Article>> {
        Ok(self.ledger.lock().await.get_article_by_url(url))
    }

    async fn update_article(&self, article: &Article) -> Result<bool> {
        self.ledger.lock().await.update_article(article)
    }

    async fn pending_approval(&self, limit: usize) -> Result<Vec<Article>> {
        Ok(self.ledger.lock().await.pending_approval(limit))
    }

    async fn unpublished(&self, limit: usize) -> Result<Vec<Article>> {
        Ok(self.ledger.lock().await.unpublished(limit))
    }

    async fn mark_published(&self, id: u64) -> Result<bool> {
        Ok(self.ledger.lock().await.mark_published(id))
    }

    async fn add_section(&self, seed: &SectionSeed) -> Result<Option<u64>> {
        Ok(self.ledger.lock().await.add_section(seed))
    }

    async fn list_sections(&self, active_only: bool) -> Result<Vec<Section>> {
        Ok(self.ledger.lock().await.list_sections(active_only))
    }

    async fn touch_last_checked(&self, section_id: u64) -> Result<()> {
        self.ledger.lock().await.touch_last_checked(section_id)
    }

    async fn set_section_active(&self, section_id: u64, active: bool) -> Result<bool> {
        Ok(self.ledger.lock().await.set_section_active(section_id, active))
    }

    async fn stats(&self) -> Result<StoreStats> {
        Ok(self.ledger.lock().await.stats())
    }
}
