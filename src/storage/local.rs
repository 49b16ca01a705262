//! Local filesystem fingerprint store.
//!
//! The ledger lives in a single JSON document. Every mutation takes an
//! exclusive lock on a sibling `.lock` file, re-reads the document, applies
//! the change and rewrites it through a temp file and rename. Processes
//! sharing one path therefore never insert a URL twice or drop each other's
//! writes. Reads are served from the copy refreshed by the last mutation.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{FingerprintStore, InsertOutcome, Ledger, StoreStats};
use crate::error::{AppError, Result};
use crate::models::{Article, Section, SectionSeed};

/// JSON-file backed fingerprint store.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    ledger: Mutex<Ledger>,
}

impl LocalStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let target = path.clone();
        let ledger = tokio::task::spawn_blocking(move || load_ledger(&target))
            .await
            .map_err(AppError::storage)??;
        let ledger = match ledger {
            Some(ledger) => ledger,
            None => {
                log::info!("No store at {}, starting empty", path.display());
                Ledger::default()
            }
        };
        Ok(Self {
            path,
            ledger: Mutex::new(ledger),
        })
    }

    /// Location of the JSON document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to the current file contents under the file lock.
    ///
    /// `change` returns the operation result and whether anything changed.
    /// On error nothing is written and the cached ledger is kept.
    async fn mutate<T, F>(&self, change: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Ledger) -> Result<(T, bool)> + Send + 'static,
    {
        let mut cached = self.ledger.lock().await;
        let path = self.path.clone();
        let (value, fresh) = tokio::task::spawn_blocking(move || apply_locked(&path, change))
            .await
            .map_err(AppError::storage)??;
        *cached = fresh;
        Ok(value)
    }
}

/// Lock, re-read, change, and write back the document at `path`.
fn apply_locked<T>(
    path: &Path,
    change: impl FnOnce(&mut Ledger) -> Result<(T, bool)>,
) -> Result<(T, Ledger)> {
    ensure_dir(path)?;
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path.with_extension("lock"))?;
    let mut lock = fd_lock::RwLock::new(lock_file);
    let _guard = lock.write()?;

    let mut ledger = load_ledger(path)?.unwrap_or_default();
    let (value, changed) = change(&mut ledger)?;
    if changed {
        write_atomic(path, &serde_json::to_vec_pretty(&ledger)?)?;
    }
    Ok((value, ledger))
}

/// Ensure the parent directory exists.
fn ensure_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write bytes atomically (write to temp, then rename).
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read and index the ledger, returning None if the file doesn't exist.
fn load_ledger(path: &Path) -> Result<Option<Ledger>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AppError::Io(e)),
    };
    let mut ledger: Ledger = serde_json::from_slice(&bytes)?;
    ledger.reindex()?;
    Ok(Some(ledger))
}

#[async_trait]
impl FingerprintStore for LocalStore {
    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        Ok(self.ledger.lock().await.exists_by_url(url))
    }

    async fn exists_by_hash(&self, hash: &str) -> Result<bool> {
        Ok(self.ledger.lock().await.exists_by_hash(hash))
    }

    async fn insert(&self, article: &Article) -> Result<InsertOutcome> {
        let article = article.clone();
        self.mutate(move |ledger| {
            let outcome = ledger.insert(&article);
            Ok((outcome, outcome.is_inserted()))
        })
        .await
    }

    async fn get_article_by_url(&self, url: &str) -> Result<Option<Article>> {
        Ok(self.ledger.lock().await.get_article_by_url(url))
    }

    async fn update_article(&self, article: &Article) -> Result<bool> {
        let article = article.clone();
        self.mutate(move |ledger| {
            let updated = ledger.update_article(&article)?;
            Ok((updated, updated))
        })
        .await
    }

    async fn pending_approval(&self, limit: usize) -> Result<Vec<Article>> {
        Ok(self.ledger.lock().await.pending_approval(limit))
    }

    async fn unpublished(&self, limit: usize) -> Result<Vec<Article>> {
        Ok(self.ledger.lock().await.unpublished(limit))
    }

    async fn mark_published(&self, id: u64) -> Result<bool> {
        self.mutate(move |ledger| {
            let marked = ledger.mark_published(id);
            Ok((marked, marked))
        })
        .await
    }

    async fn add_section(&self, seed: &SectionSeed) -> Result<Option<u64>> {
        let seed = seed.clone();
        self.mutate(move |ledger| {
            let id = ledger.add_section(&seed);
            Ok((id, id.is_some()))
        })
        .await
    }

    async fn list_sections(&self, active_only: bool) -> Result<Vec<Section>> {
        Ok(self.ledger.lock().await.list_sections(active_only))
    }

    async fn touch_last_checked(&self, section_id: u64) -> Result<()> {
        self.mutate(move |ledger| {
            ledger.touch_last_checked(section_id)?;
            Ok(((), true))
        })
        .await
    }

    async fn set_section_active(&self, section_id: u64, active: bool) -> Result<bool> {
        self.mutate(move |ledger| {
            let found = ledger.set_section_active(section_id, active);
            Ok((found, found))
        })
        .await
    }

    async fn stats(&self) -> Result<StoreStats> {
        Ok(self.ledger.lock().await.stats())
    }
}
