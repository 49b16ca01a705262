//! Fingerprint store abstractions.
//!
//! The store is the only shared mutable state of the monitor. It owns the
//! uniqueness of article URLs and content hashes, and the section records.
//!
//! ## Backends
//!
//! - `MemoryStore`: process-local, used by tests and dry runs
//! - `LocalStore`: single JSON document on disk, rewritten atomically
//!
//! ```text
//! storage/
//! └── newswatch.json     # { next ids, sections[], articles[] }
//! ```

mod ledger;
pub mod local;
pub mod memory;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::{Article, Section, SectionSeed};

use ledger::Ledger;
pub use local::LocalStore;
pub use memory::MemoryStore;

/// Which unique key an insert collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKey {
    Url,
    Hash,
}

/// Result of an insert-if-absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored under the given id
    Inserted(u64),
    /// An article with the same url or content hash already exists
    Duplicate(DuplicateKey),
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Store-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub sections: usize,
    pub active_sections: usize,
    pub articles: usize,
    pub pending_approval: usize,
    pub unpublished: usize,
}

/// Trait for fingerprint store backends.
#[async_trait]
pub trait FingerprintStore: Send + Sync {
    /// Whether an article with this URL is stored.
    async fn exists_by_url(&self, url: &str) -> Result<bool>;

    /// Whether an article with this content hash is stored.
    async fn exists_by_hash(&self, hash: &str) -> Result<bool>;

    /// Insert if neither the URL nor the hash is known.
    ///
    /// The URL is checked before the hash, so a changed article at a known
    /// URL is reported as a URL duplicate.
    async fn insert(&self, article: &Article) -> Result<InsertOutcome>;

    async fn get_article_by_url(&self, url: &str) -> Result<Option<Article>>;

    /// Replace the stored article with the same id.
    ///
    /// Returns `false` when no article has that id. Fails when the new URL or
    /// hash belongs to a different article.
    async fn update_article(&self, article: &Article) -> Result<bool>;

    /// Approval-required, unpublished articles, newest first.
    async fn pending_approval(&self, limit: usize) -> Result<Vec<Article>>;

    /// Unpublished articles, newest first.
    async fn unpublished(&self, limit: usize) -> Result<Vec<Article>>;

    async fn mark_published(&self, id: u64) -> Result<bool>;

    /// Create an active section. `None` when the name is taken.
    async fn add_section(&self, seed: &SectionSeed) -> Result<Option<u64>>;

    /// Sections in creation order.
    async fn list_sections(&self, active_only: bool) -> Result<Vec<Section>>;

    /// Record a scan attempt on a section.
    async fn touch_last_checked(&self, section_id: u64) -> Result<()>;

    async fn set_section_active(&self, section_id: u64, active: bool) -> Result<bool>;

    async fn stats(&self) -> Result<StoreStats>;
}
