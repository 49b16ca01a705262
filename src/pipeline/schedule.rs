// src/pipeline/schedule.rs

//! Periodic monitor loop.
//!
//! One pass runs to completion before the next is scheduled. A failed scan
//! is followed by a longer cooldown; a failed delivery is only logged, since
//! its articles are already stored. Waits and section boundaries observe the
//! shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use super::scan::{ScanOutcome, SectionScanner};
use crate::error::Result;
use crate::models::{Article, ScheduleConfig};

/// Receiving side of the shutdown signal.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Sending side of the shutdown signal.
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Create a connected trigger/signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    /// Ask every holder of the signal to stop.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

impl Shutdown {
    /// Whether shutdown was requested.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested.
    ///
    /// Never resolves if the trigger was dropped without firing.
    pub async fn triggered(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Sleep for `duration` unless shutdown comes first.
    ///
    /// Returns `true` when interrupted by shutdown.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }
        tokio::select! {
            _ = self.triggered() => true,
            _ = tokio::time::sleep(duration) => false,
        }
    }
}

/// Receives every non-empty batch of new articles.
#[async_trait]
pub trait ArticleSink: Send + Sync {
    async fn deliver(&self, articles: &[Article]) -> Result<()>;
}

/// Sink that only logs what was found.
pub struct LogSink;

#[async_trait]
impl ArticleSink for LogSink {
    async fn deliver(&self, articles: &[Article]) -> Result<()> {
        for article in articles {
            let state = if article.approval_required {
                "awaiting approval"
            } else {
                "ready"
            };
            log::info!(
                "New article [{}] {} ({}) {}",
                article.section,
                article.title,
                state,
                article.url
            );
        }
        Ok(())
    }
}

/// Runs scan passes until shutdown.
pub struct Monitor {
    scanner: SectionScanner,
    sink: Arc<dyn ArticleSink>,
    interval: Duration,
    cooldown: Duration,
}

impl Monitor {
    pub fn new(scanner: SectionScanner, sink: Arc<dyn ArticleSink>, schedule: &ScheduleConfig) -> Self {
        Self {
            scanner,
            sink,
            interval: Duration::from_secs(schedule.check_interval_secs),
            cooldown: Duration::from_secs(schedule.error_cooldown_secs),
        }
    }

    /// Run one pass and hand its articles to the sink.
    ///
    /// Only scan errors fail the pass. A sink error is logged and counted in
    /// `delivery_failures`.
    pub async fn run_pass(&self, shutdown: &Shutdown) -> Result<ScanOutcome> {
        let mut outcome = self.scanner.scan_all(shutdown).await?;
        if !outcome.articles.is_empty() {
            if let Err(e) = self.sink.deliver(&outcome.articles).await {
                log::error!(
                    "Delivering {} new article(s) failed: {}",
                    outcome.articles.len(),
                    e
                );
                outcome.delivery_failures += 1;
            }
        }
        Ok(outcome)
    }

    /// Loop until shutdown is requested.
    pub async fn run(&self, mut shutdown: Shutdown) -> Result<()> {
        log::info!(
            "Monitor started (interval {}s, cooldown {}s)",
            self.interval.as_secs(),
            self.cooldown.as_secs()
        );

        while !shutdown.is_triggered() {
            let wait = match self.run_pass(&shutdown).await {
                Ok(outcome) => {
                    log::info!(
                        "Pass complete: {} new article(s), next check in {}s",
                        outcome.articles.len(),
                        self.interval.as_secs()
                    );
                    self.interval
                }
                Err(e) => {
                    log::error!(
                        "Scan pass failed: {}. Cooling down for {}s",
                        e,
                        self.cooldown.as_secs()
                    );
                    self.cooldown
                }
            };

            if shutdown.sleep(wait).await {
                break;
            }
        }

        log::info!("Monitor stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::AppError;
    use crate::models::{Config, SectionSeed};
    use crate::storage::{FingerprintStore, MemoryStore};
    use crate::utils::http::testing::StaticFetcher;

    const LISTING: &str = "https://site.test/news";
    const ARTICLE: &str = "https://site.test/archives/one";

    struct RecordingSink {
        stop: Option<ShutdownTrigger>,
        batches: Mutex<Vec<usize>>,
        fail: bool,
    }

    #[async_trait]
    impl ArticleSink for RecordingSink {
        async fn deliver(&self, articles: &[Article]) -> Result<()> {
            self.batches.lock().unwrap().push(articles.len());
            if let Some(trigger) = &self.stop {
                trigger.trigger();
            }
            if self.fail {
                return Err(AppError::config("channel unavailable"));
            }
            Ok(())
        }
    }

    struct Harness {
        monitor: Monitor,
        sink: Arc<RecordingSink>,
        shutdown: Shutdown,
        /// Present when the sink does not stop the monitor itself
        trigger: Option<ShutdownTrigger>,
        fetcher: Arc<StaticFetcher>,
        store: Arc<MemoryStore>,
    }

    async fn harness(fail: bool, sink_stops: bool, interval_secs: u64) -> Harness {
        let mut config = Config::default();
        config.website.base_url = "https://site.test".into();
        config.schedule.check_interval_secs = interval_secs;
        config.schedule.error_cooldown_secs = 3600;

        let fetcher = Arc::new(
            StaticFetcher::new()
                .with_page(LISTING, r#"<a href="/archives/one">One</a>"#)
                .with_page(
                    ARTICLE,
                    r#"<div class="entry-content"><p>First story.</p></div>"#,
                ),
        );
        let store =
            Arc::new(MemoryStore::with_sections(&[SectionSeed::new("news", LISTING, "")]).await);
        let scanner = SectionScanner::new(&config, fetcher.clone(), store.clone());

        let (trigger, shutdown) = shutdown_channel();
        let (stop, trigger) = if sink_stops {
            (Some(trigger), None)
        } else {
            (None, Some(trigger))
        };
        let sink = Arc::new(RecordingSink {
            stop,
            batches: Mutex::new(Vec::new()),
            fail,
        });
        let monitor = Monitor::new(scanner, sink.clone(), &config.schedule);
        Harness {
            monitor,
            sink,
            shutdown,
            trigger,
            fetcher,
            store,
        }
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_during_interval() {
        let h = harness(false, true, 3600).await;
        tokio::time::timeout(Duration::from_secs(5), h.monitor.run(h.shutdown))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*h.sink.batches.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_sink_failure_keeps_pass_and_articles() {
        let h = harness(true, false, 3600).await;
        let outcome = h.monitor.run_pass(&h.shutdown).await.unwrap();
        assert_eq!(outcome.articles.len(), 1);
        assert_eq!(outcome.delivery_failures, 1);
        assert!(h.store.exists_by_url(ARTICLE).await.unwrap());
    }

    #[tokio::test]
    async fn test_sink_failure_waits_interval_not_cooldown() {
        let h = harness(true, false, 1).await;
        let trigger = h.trigger.unwrap();
        let fetcher = h.fetcher.clone();
        tokio::spawn(async move {
            while fetcher.request_count(LISTING) < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            trigger.trigger();
        });

        tokio::time::timeout(Duration::from_secs(10), h.monitor.run(h.shutdown))
            .await
            .expect("second pass should start after the interval")
            .unwrap();
        assert!(h.fetcher.request_count(LISTING) >= 2);
        assert_eq!(*h.sink.batches.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_failed_delivery_still_stops_on_shutdown() {
        let h = harness(true, true, 3600).await;
        tokio::time::timeout(Duration::from_secs(5), h.monitor.run(h.shutdown))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(h.sink.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sleep_returns_early_when_triggered() {
        let (trigger, mut shutdown) = shutdown_channel();
        let mut waiter = trigger.subscribe();
        trigger.trigger();
        assert!(shutdown.sleep(Duration::from_secs(3600)).await);
        waiter.triggered().await;
        assert!(waiter.is_triggered());
    }

    #[tokio::test]
    async fn test_sleep_completes_without_trigger() {
        let (_trigger, mut shutdown) = shutdown_channel();
        assert!(!shutdown.sleep(Duration::from_millis(10)).await);
    }
}
