//! newswatch CLI
//!
//! Local execution entry point for the section monitor.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use newswatch::{
    error::{AppError, Result},
    models::{Config, SectionSeed, SectionSettings},
    pipeline::{self, LogSink, Monitor, SectionScanner},
    storage::{FingerprintStore, LocalStore},
    utils::http::HttpFetcher,
};

/// newswatch - News Section Monitor
#[derive(Parser, Debug)]
#[command(
    name = "newswatch",
    version,
    about = "Watches news site sections for new articles"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "newswatch.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan all active sections periodically until Ctrl-C
    Run,

    /// Run a single scan pass
    Scan,

    /// List the first links a selector finds on a page, without saving anything
    TestSection {
        /// Listing page URL
        url: String,

        /// CSS selector for article links (default: every anchor)
        #[arg(short, long, default_value = "")]
        selector: String,
    },

    /// List stored sections
    Sections,

    /// Add a section to the store
    AddSection {
        name: String,
        url: String,

        #[arg(short, long, default_value = "")]
        selector: String,

        /// Text prepended to every article body
        #[arg(long)]
        header: Option<String>,

        /// Text appended to every article body
        #[arg(long)]
        footer: Option<String>,

        /// Tag added to every article (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Show articles awaiting approval
    Pending {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Validate the configuration file
    Validate,

    /// Show store status
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Validate the config, then open the store and seed its sections.
async fn open_store(config: &Config) -> Result<Arc<LocalStore>> {
    config.validate()?;
    let store = LocalStore::open(&config.storage.path).await?;
    pipeline::seed_sections(&store, &config.sections).await?;
    Ok(Arc::new(store))
}

fn scanner(config: &Config, store: Arc<LocalStore>) -> Result<SectionScanner> {
    let fetcher = Arc::new(HttpFetcher::from_config(&config.crawler)?);
    Ok(SectionScanner::new(config, fetcher, store))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run => {
            let store = open_store(&config).await?;
            let monitor = Monitor::new(scanner(&config, store)?, Arc::new(LogSink), &config.schedule);

            let (trigger, shutdown) = pipeline::shutdown_channel();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::info!("Ctrl-C received, shutting down...");
                    trigger.trigger();
                }
            });

            monitor.run(shutdown).await?;
        }

        Command::Scan => {
            let store = open_store(&config).await?;
            let monitor = Monitor::new(scanner(&config, store)?, Arc::new(LogSink), &config.schedule);

            let (_trigger, shutdown) = pipeline::shutdown_channel();
            let outcome = monitor.run_pass(&shutdown).await?;
            log::info!(
                "Manual check complete: {} new article(s) from {} section(s)",
                outcome.articles.len(),
                outcome.sections_scanned
            );
        }

        Command::TestSection { url, selector } => {
            config.validate()?;
            let store = Arc::new(LocalStore::open(&config.storage.path).await?);
            let links = scanner(&config, store)?.test_section(&url, &selector).await?;

            log::info!("Found {} link(s) on {}", links.len(), url);
            for (i, link) in links.iter().enumerate() {
                println!("{:>2}. {}", i + 1, link);
            }
        }

        Command::Sections => {
            let store = open_store(&config).await?;
            let sections = store.list_sections(false).await?;
            if sections.is_empty() {
                log::info!("No sections configured.");
            }
            for s in sections {
                let checked = s
                    .last_checked_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "[{}] {} {} ({} articles, last checked {}){}",
                    s.id,
                    s.name,
                    s.url,
                    s.articles_count,
                    checked,
                    if s.active { "" } else { " [inactive]" }
                );
            }
        }

        Command::AddSection {
            name,
            url,
            selector,
            header,
            footer,
            tags,
        } => {
            let seed = SectionSeed {
                settings: SectionSettings {
                    header,
                    footer,
                    default_tags: tags,
                }
                .normalized(),
                ..SectionSeed::new(name, url, selector)
            };
            seed.validate()?;

            let store = open_store(&config).await?;
            match store.add_section(&seed).await? {
                Some(id) => log::info!("Added section {} with id {}", seed.name, id),
                None => {
                    return Err(AppError::validation(format!(
                        "Section '{}' already exists",
                        seed.name
                    )));
                }
            }
        }

        Command::Pending { limit } => {
            let store = open_store(&config).await?;
            let pending = store.pending_approval(limit).await?;
            if pending.is_empty() {
                log::info!("No articles awaiting approval.");
            }
            for article in pending {
                println!(
                    "[{}] {} | {} | {}",
                    article.id.unwrap_or_default(),
                    article.section,
                    article.title,
                    article.url
                );
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} seeded section(s), base URL {})",
                config.sections.len(),
                config.website.base_url
            );
        }

        Command::Info => {
            log::info!("Store: {}", config.storage.path);
            let store = LocalStore::open(&config.storage.path).await?;
            let stats = store.stats().await?;
            log::info!(
                "Sections: {} ({} active)",
                stats.sections,
                stats.active_sections
            );
            log::info!(
                "Articles: {} ({} unpublished, {} awaiting approval)",
                stats.articles,
                stats.unpublished,
                stats.pending_approval
            );
            log::info!(
                "Auto-publish: {}, check interval: {}s",
                config.publishing.auto_publish,
                config.schedule.check_interval_secs
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
