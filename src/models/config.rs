//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SectionSeed;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Monitored website
    #[serde(default)]
    pub website: WebsiteConfig,

    /// HTTP behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Keyword filters applied to every candidate article
    #[serde(default)]
    pub filter: FilterConfig,

    /// Approval and summary settings
    #[serde(default)]
    pub publishing: PublishingConfig,

    /// Periodic scan timing
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Fingerprint store location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Sections seeded into the store at startup
    #[serde(default)]
    pub sections: Vec<SectionSeed>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        for seed in &mut config.sections {
            seed.settings = seed.settings.normalized();
        }
        Ok(config)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.website.base_url.trim().is_empty() {
            return Err(AppError::validation("website.base_url is empty"));
        }
        url::Url::parse(&self.website.base_url).map_err(|e| {
            AppError::validation(format!(
                "website.base_url '{}' is not a URL: {e}",
                self.website.base_url
            ))
        })?;
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.publishing.summary_max_length == 0 {
            return Err(AppError::validation(
                "publishing.summary_max_length must be > 0",
            ));
        }
        if self.schedule.check_interval_secs == 0 {
            return Err(AppError::validation(
                "schedule.check_interval_secs must be > 0",
            ));
        }

        let mut names = HashSet::new();
        for seed in &self.sections {
            seed.validate()?;
            if !names.insert(seed.name.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate section name '{}'",
                    seed.name
                )));
            }
        }
        Ok(())
    }
}

/// Monitored website settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebsiteConfig {
    /// URL prefix every candidate article must share
    #[serde(default)]
    pub base_url: String,
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between article requests in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: 0,
        }
    }
}

/// Include/exclude keyword rules.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FilterConfig {
    /// Any match drops the article
    #[serde(default)]
    pub exclude_keywords: Vec<String>,

    /// When non-empty, at least one must match
    #[serde(default)]
    pub include_keywords: Vec<String>,
}

/// Approval and summary settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishingConfig {
    /// Publish without human review
    #[serde(default)]
    pub auto_publish: bool,

    /// Maximum summary length in characters
    #[serde(default = "defaults::summary_max_length")]
    pub summary_max_length: usize,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            auto_publish: false,
            summary_max_length: defaults::summary_max_length(),
        }
    }
}

/// Scan loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Delay between two successful passes
    #[serde(default = "defaults::check_interval")]
    pub check_interval_secs: u64,

    /// Delay after a pass failed unexpectedly
    #[serde(default = "defaults::error_cooldown")]
    pub error_cooldown_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: defaults::check_interval(),
            error_cooldown_secs: defaults::error_cooldown(),
        }
    }
}

/// Fingerprint store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON store file
    #[serde(default = "defaults::storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: defaults::storage_path(),
        }
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; newswatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn summary_max_length() -> usize {
        200
    }
    pub fn check_interval() -> u64 {
        60
    }
    pub fn error_cooldown() -> u64 {
        300
    }
    pub fn storage_path() -> String {
        "storage/newswatch.json".into()
    }
}
