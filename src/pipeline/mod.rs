//! Pipeline entry points for monitor operations.
//!
//! - `SectionScanner`: one pass over every active section, plus dry runs
//! - `Monitor`: periodic passes with cooldown and shutdown
//! - `seed_sections`: configured sections into the store

pub mod scan;
pub mod schedule;
pub mod sections;

pub use scan::{ScanOutcome, SectionScanner, TEST_LINK_LIMIT};
pub use schedule::{ArticleSink, LogSink, Monitor, Shutdown, ShutdownTrigger, shutdown_channel};
pub use sections::seed_sections;
