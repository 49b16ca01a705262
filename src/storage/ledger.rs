//! In-memory state shared by the store backends.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{DuplicateKey, InsertOutcome, StoreStats};
use crate::error::{AppError, Result};
use crate::models::{Article, Section, SectionSeed};

/// Sections and articles with url/hash indexes.
///
/// The indexes are not serialized; call `reindex` after deserializing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default = "first_id")]
    next_section_id: u64,
    #[serde(default = "first_id")]
    next_article_id: u64,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    articles: Vec<Article>,

    #[serde(skip)]
    by_url: HashMap<String, usize>,
    #[serde(skip)]
    by_hash: HashMap<String, usize>,
}

fn first_id() -> u64 {
    1
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            next_section_id: first_id(),
            next_article_id: first_id(),
            sections: Vec::new(),
            articles: Vec::new(),
            by_url: HashMap::new(),
            by_hash: HashMap::new(),
        }
    }
}

impl Ledger {
    /// Rebuild the url and hash indexes from the article list.
    ///
    /// Fails if the stored articles violate uniqueness.
    pub fn reindex(&mut self) -> Result<()> {
        self.by_url.clear();
        self.by_hash.clear();
        for (pos, article) in self.articles.iter().enumerate() {
            if self.by_url.insert(article.url.clone(), pos).is_some() {
                return Err(AppError::storage(format!("Duplicate stored url {}", article.url)));
            }
            if self.by_hash.insert(article.content_hash.clone(), pos).is_some() {
                return Err(AppError::storage(format!(
                    "Duplicate stored hash {}",
                    article.content_hash
                )));
            }
        }
        Ok(())
    }

    pub fn exists_by_url(&self, url: &str) -> bool {
        self.by_url.contains_key(url)
    }

    pub fn exists_by_hash(&self, hash: &str) -> bool {
        self.by_hash.contains_key(hash)
    }

    pub fn insert(&mut self, article: &Article) -> InsertOutcome {
        if self.exists_by_url(&article.url) {
            return InsertOutcome::Duplicate(DuplicateKey::Url);
        }
        if self.exists_by_hash(&article.content_hash) {
            return InsertOutcome::Duplicate(DuplicateKey::Hash);
        }

        let id = self.next_article_id;
        self.next_article_id += 1;

        let mut stored = article.clone();
        stored.id = Some(id);
        let pos = self.articles.len();
        self.by_url.insert(stored.url.clone(), pos);
        self.by_hash.insert(stored.content_hash.clone(), pos);

        if let Some(section) = self.sections.iter_mut().find(|s| s.name == stored.section) {
            section.articles_count += 1;
        }
        self.articles.push(stored);
        InsertOutcome::Inserted(id)
    }

    pub fn get_article_by_url(&self, url: &str) -> Option<Article> {
        self.by_url.get(url).map(|&pos| self.articles[pos].clone())
    }

    pub fn update_article(&mut self, article: &Article) -> Result<bool> {
        let Some(id) = article.id else {
            return Ok(false);
        };
        let Some(pos) = self.articles.iter().position(|a| a.id == Some(id)) else {
            return Ok(false);
        };

        let url_owner = self.by_url.get(&article.url).copied();
        let hash_owner = self.by_hash.get(&article.content_hash).copied();
        if url_owner.is_some_and(|p| p != pos) {
            return Err(AppError::storage(format!(
                "Url {} belongs to another article",
                article.url
            )));
        }
        if hash_owner.is_some_and(|p| p != pos) {
            return Err(AppError::storage(format!(
                "Hash {} belongs to another article",
                article.content_hash
            )));
        }

        let old = &self.articles[pos];
        self.by_url.remove(&old.url);
        self.by_hash.remove(&old.content_hash);
        self.by_url.insert(article.url.clone(), pos);
        self.by_hash.insert(article.content_hash.clone(), pos);
        self.articles[pos] = article.clone();
        Ok(true)
    }

    pub fn pending_approval(&self, limit: usize) -> Vec<Article> {
        self.newest_first(limit, |a| a.approval_required && !a.published)
    }

    pub fn unpublished(&self, limit: usize) -> Vec<Article> {
        self.newest_first(limit, |a| !a.published)
    }

    fn newest_first(&self, limit: usize, keep: impl Fn(&Article) -> bool) -> Vec<Article> {
        let mut found: Vec<&Article> = self.articles.iter().filter(|a| keep(a)).collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        found.into_iter().take(limit).cloned().collect()
    }

    pub fn mark_published(&mut self, id: u64) -> bool {
        match self.articles.iter_mut().find(|a| a.id == Some(id)) {
            Some(article) => {
                article.published = true;
                true
            }
            None => false,
        }
    }

    pub fn add_section(&mut self, seed: &SectionSeed) -> Option<u64> {
        if self.sections.iter().any(|s| s.name == seed.name) {
            return None;
        }
        let id = self.next_section_id;
        self.next_section_id += 1;
        self.sections.push(Section::from_seed(id, seed));
        Some(id)
    }

    pub fn list_sections(&self, active_only: bool) -> Vec<Section> {
        self.sections
            .iter()
            .filter(|s| !active_only || s.active)
            .cloned()
            .collect()
    }

    pub fn touch_last_checked(&mut self, section_id: u64) -> Result<()> {
        let section = self.section_mut(section_id)?;
        section.last_checked_at = Some(Utc::now());
        Ok(())
    }

    pub fn set_section_active(&mut self, section_id: u64, active: bool) -> bool {
        match self.section_mut(section_id) {
            Ok(section) => {
                section.active = active;
                true
            }
            Err(_) => false,
        }
    }

    fn section_mut(&mut self, section_id: u64) -> Result<&mut Section> {
        self.sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .ok_or_else(|| AppError::storage(format!("Unknown section id {section_id}")))
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            sections: self.sections.len(),
            active_sections: self.sections.iter().filter(|s| s.active).count(),
            articles: self.articles.len(),
            pending_approval: self
                .articles
                .iter()
                .filter(|a| a.approval_required && !a.published)
                .count(),
            unpublished: self.articles.iter().filter(|a| !a.published).count(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Duration, Utc};

    use crate::models::Article;

    /// A minimal article with a consistent hash.
    pub fn article(url: &str, title: &str, section: &str) -> Article {
        let body = format!("Body of {title}.");
        Article {
            id: None,
            url: url.to_string(),
            title: title.to_string(),
            summary: body.clone(),
            content_hash: Article::fingerprint(url, title, &body),
            body,
            author: String::new(),
            publish_date: Utc::now(),
            section: section.to_string(),
            image_url: String::new(),
            tags: Vec::new(),
            approval_required: true,
            published: false,
            created_at: Utc::now(),
        }
    }

    /// Same as `article`, created `minutes` ago.
    pub fn aged(url: &str, title: &str, minutes: i64) -> Article {
        let mut a = article(url, title, "news");
        a.created_at = Utc::now() - Duration::minutes(minutes);
        a
    }
}
