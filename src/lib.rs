//! Budget-bounded website crawling with schema-consistent AI conversion.
//!
//! webdistill crawls a single site breadth-first under depth, page, and
//! pacing budgets, captures each page as a structural record, then
//! streams the captures through an extraction oracle (an LLM provider)
//! to produce uniform structured records against a run-scoped schema.
//! Every phase checkpoints to plain JSON snapshots, so interrupted runs
//! resume instead of restarting.
//!
//! # Design
//!
//! - The fetcher and the oracle are narrow ports ([`Fetcher`],
//!   [`Oracle`]); the core never touches a network API directly and is
//!   fully testable with the deterministic mocks in [`testing`].
//! - The schema is established once per run (inferred from a sample or
//!   reloaded from a prior run) and never mutated afterward, which is
//!   what makes output from multiple runs mergeable.
//! - Both external services are assumed rate-limited: one request in
//!   flight at a time, with a minimum interval between requests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use webdistill::{pipeline, HttpFetcher, RunConfig};
//! use webdistill::oracles;
//!
//! let config = RunConfig::new("https://example.com", "./scraped_data");
//! let fetcher = HttpFetcher::new();
//! let oracle = oracles::for_provider("gemini")?;
//! let summary = pipeline::run(&config, &fetcher, oracle.as_ref()).await?;
//! println!("{} pages, {} records", summary.pages_fetched, summary.records_converted);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Port abstractions (Fetcher, Oracle)
//! - [`types`] - Records, schema, config, and progress types
//! - [`crawl`] - Frontier, URL filter, capture, and the crawl engine
//! - [`convert`] - Schema coordinator and converter
//! - [`oracles`] - Provider adapters (OpenAI, Claude, Gemini, Grok)
//! - [`fetchers`] - HTTP fetcher
//! - [`store`] - Atomic JSON snapshot persistence
//! - [`pipeline`] - End-to-end orchestration
//! - [`testing`] - Mock fetcher and oracle

pub mod convert;
pub mod crawl;
pub mod error;
pub mod fetchers;
pub mod oracles;
pub mod pipeline;
pub mod store;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{DistillError, FetchError, OracleError, PersistError, Result};
pub use traits::{
    fetcher::Fetcher,
    oracle::{CandidateRecord, Oracle},
};
pub use types::{
    config::{ConvertConfig, CrawlConfig, RunConfig},
    page::{FetchedPage, RawPageRecord},
    progress::{ConversionProgress, CrawlOutcome, CrawlProgress, RunSummary},
    schema::{RecordMetadata, Schema, StructuredRecord},
};

// Re-export engines and stores
pub use convert::{ConvertReport, Converter, SchemaCoordinator};
pub use crawl::{CrawlEngine, CrawlReport, Frontier, FrontierEntry, UrlFilter};
pub use fetchers::HttpFetcher;
pub use oracles::{ClaudeOracle, GeminiOracle, GrokOracle, OpenAiOracle};
pub use store::DataStore;

// Re-export testing utilities
pub use testing::{MockFetcher, MockOracle};
