//! Article data structure and content fingerprint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An article discovered on a monitored section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    /// Store-assigned identifier, `None` until persisted
    #[serde(default)]
    pub id: Option<u64>,

    /// Canonical article URL
    pub url: String,

    /// Article title
    pub title: String,

    /// Body in normalized markdown form
    pub body: String,

    /// Bounded plain-text summary
    #[serde(default)]
    pub summary: String,

    /// First reported author, empty if unknown
    #[serde(default)]
    pub author: String,

    /// Publish date (processing time when the page gives none)
    pub publish_date: DateTime<Utc>,

    /// Name of the owning section
    pub section: String,

    /// Lead image URL, empty if none
    #[serde(default)]
    pub image_url: String,

    /// Ordered tags, duplicates allowed
    #[serde(default)]
    pub tags: Vec<String>,

    /// Fingerprint of url, title, and body at extraction time
    pub content_hash: String,

    /// Needs human review before publication
    #[serde(default)]
    pub approval_required: bool,

    /// Already sent to the channel
    #[serde(default)]
    pub published: bool,

    /// Time the article was extracted
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// Compute the content fingerprint for a (url, title, body) triple.
    ///
    /// Lowercase hex SHA-256 of the three fields concatenated.
    pub fn fingerprint(url: &str, title: &str, body: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hasher.update(title.as_bytes());
        hasher.update(body.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Recompute `content_hash` from the current fields.
    pub fn refresh_hash(&mut self) {
        self.content_hash = Self::fingerprint(&self.url, &self.title, &self.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = Article::fingerprint("https://x.com/a", "Title", "Body");
        let b = Article::fingerprint("https://x.com/a", "Title", "Body");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_changes_with_body() {
        let a = Article::fingerprint("https://x.com/a", "Title", "Body");
        let b = Article::fingerprint("https://x.com/a", "Title", "Body edited");
        assert_ne!(a, b);
    }
}
