//! Monitored section (category/listing page) structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A monitored category/listing page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    /// Store-assigned identifier
    pub id: u64,

    /// Unique section name
    pub name: String,

    /// Listing page URL
    pub url: String,

    /// CSS selector for article links (empty means every anchor)
    #[serde(default)]
    pub selector: String,

    /// Whether the section takes part in scans
    #[serde(default = "default_active")]
    pub active: bool,

    /// Time of the last scan attempt, successful or not
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,

    /// Number of articles stored for this section
    #[serde(default)]
    pub articles_count: u64,

    /// Formatting and tagging overrides
    #[serde(default)]
    pub settings: SectionSettings,
}

fn default_active() -> bool {
    true
}

impl Section {
    /// Build a fresh, active section from a seed.
    pub fn from_seed(id: u64, seed: &SectionSeed) -> Self {
        Self {
            id,
            name: seed.name.clone(),
            url: seed.url.clone(),
            selector: seed.selector.clone(),
            active: true,
            last_checked_at: None,
            articles_count: 0,
            settings: seed.settings.normalized(),
        }
    }
}

/// Per-section overrides applied to every article of the section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SectionSettings {
    /// Text prepended to the article body
    #[serde(default, alias = "custom_header", skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    /// Text appended to the article body
    #[serde(default, alias = "custom_footer", skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,

    /// Tags added to every article
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_tags: Vec<String>,
}

impl SectionSettings {
    /// Trim values and drop blank ones.
    pub fn normalized(&self) -> Self {
        fn clean(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Self {
            header: clean(&self.header),
            footer: clean(&self.footer),
            default_tags: self
                .default_tags
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Section definition as written in configuration or by an admin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionSeed {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub selector: String,
    #[serde(flatten)]
    pub settings: SectionSettings,
}

impl SectionSeed {
    /// Create a seed without custom settings.
    pub fn new(name: impl Into<String>, url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            selector: selector.into(),
            settings: SectionSettings::default(),
        }
    }

    /// Check name, URL, and selector syntax.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Section name is empty"));
        }
        url::Url::parse(&self.url).map_err(|e| {
            AppError::validation(format!("Section '{}' has invalid URL: {e}", self.name))
        })?;
        if !self.selector.trim().is_empty() {
            scraper::Selector::parse(&self.selector)
                .map_err(|e| AppError::selector(&self.selector, format!("{e:?}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_accept_legacy_keys() {
        let json = r#"{"custom_header": "Top", "custom_footer": "", "default_tags": ["a"]}"#;
        let settings: SectionSettings = serde_json::from_str(json).unwrap();
        let settings = settings.normalized();
        assert_eq!(settings.header.as_deref(), Some("Top"));
        assert_eq!(settings.footer, None);
        assert_eq!(settings.default_tags, vec!["a"]);
    }

    #[test]
    fn test_seed_validate_rejects_bad_selector() {
        let seed = SectionSeed::new("news", "https://example.com/news", "[[invalid");
        assert!(seed.validate().is_err());
    }

    #[test]
    fn test_seed_validate_accepts_empty_selector() {
        let seed = SectionSeed::new("news", "https://example.com/news", "");
        assert!(seed.validate().is_ok());
    }

    #[test]
    fn test_from_seed_is_active() {
        let seed = SectionSeed::new("news", "https://example.com/news", "a");
        let section = Section::from_seed(7, &seed);
        assert_eq!(section.id, 7);
        assert!(section.active);
        assert!(section.last_checked_at.is_none());
    }
}
