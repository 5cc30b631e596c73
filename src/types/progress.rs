//! Persisted progress state for crash-resumable runs.
//!
//! The on-disk snapshots of these types are the sole source of truth
//! for resumption: in-memory state is always reconstructible from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::crawl::frontier::FrontierEntry;
use crate::types::schema::StructuredRecord;

/// Crawl-phase progress, owned exclusively by the crawl engine and
/// persisted after every fetched page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlProgress {
    /// Seed the run was started with; resumption requires a match
    pub seed_url: String,

    /// When the run first started
    pub started_at: DateTime<Utc>,

    /// URLs already fetched or attempted
    pub visited: BTreeSet<String>,

    /// Queued entries not yet fetched, in FIFO order
    pub frontier: Vec<FrontierEntry>,

    /// Successful fetches so far
    pub pages_fetched: usize,

    /// Fetch attempts so far, successful or not (budget consumption)
    pub pages_attempted: usize,

    /// URL → error message for fetches that failed
    #[serde(default)]
    pub failures: BTreeMap<String, String>,
}

impl CrawlProgress {
    /// Fresh progress for a new run.
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            started_at: Utc::now(),
            visited: BTreeSet::new(),
            frontier: Vec::new(),
            pages_fetched: 0,
            pages_attempted: 0,
            failures: BTreeMap::new(),
        }
    }
}

/// Why a crawl loop stopped. All three are normal terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrawlOutcome {
    /// Frontier emptied before the page budget ran out
    Completed,

    /// Page budget hit with work still queued
    BudgetExhausted,

    /// Cancellation requested; progress persisted for resumption
    Suspended,
}

/// One page the converter gave up on after its retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionFailure {
    /// Source page URL
    pub url: String,

    /// What went wrong on the final attempt
    pub error: String,
}

/// Conversion-phase progress, owned exclusively by the converter and
/// persisted after every batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionProgress {
    /// URLs already processed, including recorded failures; never
    /// re-submitted to the oracle
    pub converted_urls: BTreeSet<String>,

    /// Records produced so far, in input order
    pub structured_records: Vec<StructuredRecord>,

    /// Pages skipped after persistent oracle failure
    #[serde(default)]
    pub errors: Vec<ConversionFailure>,
}

impl ConversionProgress {
    /// Empty progress for a fresh conversion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this URL has already been processed.
    pub fn is_done(&self, url: &str) -> bool {
        self.converted_urls.contains(url)
    }
}

/// End-of-run accounting. Partial success is the expected common case,
/// so the run reports counts rather than a bare pass/fail flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Pages fetched successfully
    pub pages_fetched: usize,

    /// Fetch attempts that failed
    pub pages_failed: usize,

    /// Structured records produced
    pub records_converted: usize,

    /// Pages the converter gave up on
    pub records_failed: usize,

    /// How the crawl phase ended
    pub crawl_outcome: Option<CrawlOutcome>,
}
