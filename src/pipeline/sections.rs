// src/pipeline/sections.rs

//! Seeding configured sections into the store.

use crate::error::Result;
use crate::models::SectionSeed;
use crate::storage::FingerprintStore;

/// Add every seed whose name is not yet in the store.
///
/// Existing sections are left untouched, including their active flag and
/// settings. Returns the number of sections added.
pub async fn seed_sections(store: &dyn FingerprintStore, seeds: &[SectionSeed]) -> Result<usize> {
    let mut added = 0;
    for seed in seeds {
        match store.add_section(seed).await? {
            Some(id) => {
                log::info!("Added section {} (id {}) from configuration", seed.name, id);
                added += 1;
            }
            None => log::debug!("Section {} already exists", seed.name),
        }
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_seeding_is_idempotent_by_name() {
        let store = MemoryStore::new();
        let seeds = vec![
            SectionSeed::new("news", "https://site.test/news", "a"),
            SectionSeed::new("sport", "https://site.test/sport", ""),
        ];
        assert_eq!(seed_sections(&store, &seeds).await.unwrap(), 2);
        store.set_section_active(2, false).await.unwrap();

        let renamed_url = vec![SectionSeed::new("sport", "https://site.test/other", "")];
        assert_eq!(seed_sections(&store, &renamed_url).await.unwrap(), 0);

        let sections = store.list_sections(false).await.unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].url, "https://site.test/sport");
        assert!(!sections[1].active);
    }
}
