//! Budget-bounded, resumable crawl engine.
//!
//! Drives the fetch → capture → enqueue loop breadth-first under depth
//! and page budgets with politeness pacing, persisting progress after
//! every page so an interrupted run can resume from disk.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::crawl::extract::build_page_record;
use crate::crawl::filter::UrlFilter;
use crate::crawl::frontier::Frontier;
use crate::error::{DistillError, Result};
use crate::store::DataStore;
use crate::traits::fetcher::Fetcher;
use crate::types::{
    config::CrawlConfig,
    page::RawPageRecord,
    progress::{CrawlOutcome, CrawlProgress},
};

/// What a crawl produced and how it ended.
#[derive(Debug)]
pub struct CrawlReport {
    /// All raw page records, including those loaded from a resumed run
    pub pages: Vec<RawPageRecord>,

    /// Terminal state of the crawl loop
    pub outcome: CrawlOutcome,

    /// Successful fetches across the whole run
    pub pages_fetched: usize,

    /// Failed fetch attempts across the whole run
    pub pages_failed: usize,
}

/// Minimum inter-request interval, measured from when each fetch
/// begins. A slow fetch eats into its own interval instead of
/// stacking extra sleep on top.
pub(crate) struct Pacer {
    min_interval: Duration,
    next_allowed: Option<Instant>,
}

impl Pacer {
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_allowed: None,
        }
    }

    pub(crate) async fn pace(&mut self) {
        if let Some(at) = self.next_allowed {
            tokio::time::sleep_until(at).await;
        }
        self.next_allowed = Some(Instant::now() + self.min_interval);
    }
}

/// Single-site crawl engine over a pluggable [`Fetcher`].
///
/// The engine exclusively owns [`CrawlProgress`] for the duration of a
/// run. The fetcher is treated as a rate-limited external service, so
/// exactly one fetch is in flight at any time.
pub struct CrawlEngine<'a, F: Fetcher + ?Sized> {
    fetcher: &'a F,
    config: CrawlConfig,
    store: &'a DataStore,
    cancel: CancellationToken,
}

impl<'a, F: Fetcher + ?Sized> CrawlEngine<'a, F> {
    /// Create an engine for one run.
    pub fn new(fetcher: &'a F, config: CrawlConfig, store: &'a DataStore) -> Self {
        Self {
            fetcher,
            config,
            store,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an external cancellation token; cancelling suspends the run
    /// at the next loop iteration with progress already persisted.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the crawl to a terminal state.
    ///
    /// Guarantees: no URL fetched twice, no entry beyond `max_depth`,
    /// at most `max_pages` fetch attempts (failures consume budget too,
    /// so the loop terminates even on an infinite site), and a
    /// resumable snapshot on disk after every page.
    pub async fn crawl(&self) -> Result<CrawlReport> {
        self.config.validate()?;

        let seed = Url::parse(&self.config.seed_url).map_err(|_| DistillError::InvalidUrl {
            url: self.config.seed_url.clone(),
        })?;
        let filter = UrlFilter::new(
            &self.config,
            seed.host_str().unwrap_or_default().to_string(),
        );

        let (mut progress, mut frontier, mut pages) = self.load_or_start(&seed)?;

        info!(
            seed = %seed,
            max_depth = self.config.max_depth,
            max_pages = self.config.max_pages,
            resumed_pages = pages.len(),
            "crawl starting"
        );

        let mut pacer = Pacer::new(self.config.delay);

        let outcome = loop {
            if self.cancel.is_cancelled() {
                break CrawlOutcome::Suspended;
            }
            if frontier.is_empty() {
                break CrawlOutcome::Completed;
            }
            if progress.pages_attempted >= self.config.max_pages {
                break CrawlOutcome::BudgetExhausted;
            }

            let Some(entry) = frontier.next() else {
                break CrawlOutcome::Completed;
            };

            pacer.pace().await;

            debug!(url = %entry.url, depth = entry.depth, "fetching");
            progress.pages_attempted += 1;
            frontier.mark_done(&entry.url);
            progress.visited.insert(entry.url.clone());

            match self.fetcher.fetch(&entry.url).await {
                Ok(fetched) => {
                    match Url::parse(&fetched.final_url) {
                        Ok(final_url) => {
                            if let Some(record) = self.capture(
                                &entry.url,
                                entry.depth,
                                &final_url,
                                &fetched.html,
                                &filter,
                                &mut frontier,
                                &mut progress,
                            ) {
                                pages.push(record);
                                progress.pages_fetched += 1;
                                info!(
                                    url = %final_url,
                                    fetched = progress.pages_fetched,
                                    budget = self.config.max_pages,
                                    depth = entry.depth,
                                    "page captured"
                                );
                            }
                        }
                        Err(_) => {
                            warn!(url = %entry.url, final_url = %fetched.final_url, "unparseable final URL");
                            progress
                                .failures
                                .insert(entry.url.clone(), "unparseable final URL".to_string());
                        }
                    };
                }
                Err(e) => {
                    warn!(url = %entry.url, error = %e, "fetch failed");
                    progress.failures.insert(entry.url.clone(), e.to_string());
                }
            }

            self.persist(&mut progress, &frontier, &pages)?;
        };

        // Leave an accurate snapshot for whichever terminal state we hit
        self.persist(&mut progress, &frontier, &pages)?;

        info!(
            outcome = ?outcome,
            pages_fetched = progress.pages_fetched,
            pages_failed = progress.failures.len(),
            "crawl finished"
        );

        Ok(CrawlReport {
            pages,
            outcome,
            pages_fetched: progress.pages_fetched,
            pages_failed: progress.failures.len(),
        })
    }

    /// Build the page record and admit its in-scope links. Returns
    /// `None` when a redirect landed on an already-captured URL.
    #[allow(clippy::too_many_arguments)]
    fn capture(
        &self,
        requested_url: &str,
        depth: usize,
        final_url: &Url,
        html: &str,
        filter: &UrlFilter,
        frontier: &mut Frontier,
        progress: &mut CrawlProgress,
    ) -> Option<RawPageRecord> {
        // Redirects dedup on the final URL
        if final_url.as_str() != requested_url {
            if frontier.is_seen(final_url.as_str()) {
                debug!(url = %requested_url, final_url = %final_url, "redirect target already captured");
                return None;
            }
            frontier.mark_done(final_url.as_str());
            progress.visited.insert(final_url.to_string());
        }

        let record = build_page_record(final_url, html);

        if depth < self.config.max_depth {
            let mut admitted = 0usize;
            for link in &record.outbound_links {
                if let Ok(link_url) = Url::parse(link) {
                    if filter.should_crawl(&link_url) && frontier.admit(link.clone(), depth + 1) {
                        admitted += 1;
                    }
                }
            }
            debug!(url = %final_url, admitted, "links admitted");
        }

        Some(record)
    }

    /// Resume from persisted progress when it matches this seed,
    /// otherwise start fresh. The seed is admitted at depth 0 without
    /// consulting the filter: the starting point is always in scope.
    fn load_or_start(&self, seed: &Url) -> Result<(CrawlProgress, Frontier, Vec<RawPageRecord>)> {
        if let Some(progress) = self.store.load_crawl_progress()? {
            if progress.seed_url == self.config.seed_url {
                let frontier = Frontier::restore(
                    self.config.max_depth,
                    progress.visited.iter().cloned(),
                    progress.frontier.iter().cloned(),
                );
                let pages = self.store.load_raw_pages()?.unwrap_or_default();
                info!(
                    visited = progress.visited.len(),
                    queued = frontier.pending(),
                    "resuming from persisted progress"
                );
                return Ok((progress, frontier, pages));
            }
            warn!(
                persisted_seed = %progress.seed_url,
                seed = %self.config.seed_url,
                "persisted progress is for a different seed, starting fresh"
            );
        }

        let mut frontier = Frontier::new(self.config.max_depth);
        frontier.admit(seed.as_str(), 0);
        Ok((CrawlProgress::new(seed.as_str()), frontier, Vec::new()))
    }

    fn persist(
        &self,
        progress: &mut CrawlProgress,
        frontier: &Frontier,
        pages: &[RawPageRecord],
    ) -> Result<()> {
        progress.frontier = frontier.snapshot();
        self.store.save_crawl_progress(progress)?;
        self.store.save_raw_pages(pages)?;
        Ok(())
    }
}
