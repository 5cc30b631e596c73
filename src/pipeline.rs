//! End-to-end orchestration: crawl → schema → convert.
//!
//! Mirrors the phases a front end drives one after another. Each phase
//! leaves its own persisted snapshot, so a failed or suspended run can
//! be re-invoked with the same config and pick up where it stopped.

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::convert::{Converter, SchemaCoordinator};
use crate::crawl::CrawlEngine;
use crate::error::Result;
use crate::store::DataStore;
use crate::traits::{Fetcher, Oracle};
use crate::types::{
    config::RunConfig,
    progress::{CrawlOutcome, RunSummary},
};

/// Run a full crawl-and-convert pipeline.
pub async fn run<F, O>(config: &RunConfig, fetcher: &F, oracle: &O) -> Result<RunSummary>
where
    F: Fetcher + ?Sized,
    O: Oracle + ?Sized,
{
    run_with_cancellation(config, fetcher, oracle, CancellationToken::new()).await
}

/// Run a full pipeline with an external cancellation token.
///
/// Cancellation suspends the crawl at its next loop iteration;
/// conversion is then skipped so the next invocation resumes both
/// phases from their persisted progress.
pub async fn run_with_cancellation<F, O>(
    config: &RunConfig,
    fetcher: &F,
    oracle: &O,
    cancel: CancellationToken,
) -> Result<RunSummary>
where
    F: Fetcher + ?Sized,
    O: Oracle + ?Sized,
{
    let store = DataStore::open(&config.output_dir)?;

    let engine =
        CrawlEngine::new(fetcher, config.crawl.clone(), &store).with_cancellation(cancel);
    let crawl = engine.crawl().await?;

    let mut summary = RunSummary {
        pages_fetched: crawl.pages_fetched,
        pages_failed: crawl.pages_failed,
        records_converted: 0,
        records_failed: 0,
        crawl_outcome: Some(crawl.outcome),
    };

    if config.skip_conversion {
        info!("conversion skipped by config, raw data persisted");
        return Ok(summary);
    }
    if crawl.outcome == CrawlOutcome::Suspended {
        info!("run suspended, conversion deferred to the next invocation");
        return Ok(summary);
    }
    if crawl.pages.is_empty() {
        warn!("no pages captured, nothing to convert");
        return Ok(summary);
    }

    // Inference failure is fatal here, but the raw captures above are
    // already persisted, so conversion can be retried independently.
    let coordinator = SchemaCoordinator::new(oracle, &store);
    let schema = coordinator.obtain_schema(&crawl.pages, &config.convert).await?;

    let run_label = Utc::now().format("%Y%m%d_%H%M%S").to_string();
    let converter = Converter::new(oracle, config.convert.clone(), &store);
    let convert = converter
        .convert_all(&crawl.pages, &schema, &run_label)
        .await?;

    summary.records_converted = convert.records_converted;
    summary.records_failed = convert.records_failed;

    info!(
        pages_fetched = summary.pages_fetched,
        pages_failed = summary.pages_failed,
        records_converted = summary.records_converted,
        records_failed = summary.records_failed,
        "run finished"
    );

    Ok(summary)
}
