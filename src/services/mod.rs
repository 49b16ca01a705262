//! Service layer for the monitor.
//!
//! This module contains the business logic for:
//! - Link discovery on listing pages (`LinkDiscovery`)
//! - Article extraction with fallback strategies (`ExtractionEngine`)
//! - Keyword filtering and section formatting (`ArticleFilter`)

pub mod extract;
mod filter;
mod links;

pub use extract::{ExtractionEngine, ExtractionStrategy, PartialArticle};
pub use filter::{ArticleFilter, apply_section_settings};
pub use links::{DENYLIST, LinkDiscovery};
