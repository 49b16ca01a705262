//! Domain models for the monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod article;
mod config;
mod section;

// Re-export all public types
pub use article::Article;
pub use config::{
    Config, CrawlerConfig, FilterConfig, PublishingConfig, ScheduleConfig, StorageConfig,
    WebsiteConfig,
};
pub use section::{Section, SectionSeed, SectionSettings};
