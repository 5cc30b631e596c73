//! Fetcher port: turns a URL into rendered HTML.
//!
//! The crawl engine treats fetching as opaque. Implementations may be
//! a plain HTTP client, a headless browser, or a canned mock; the only
//! requirement is that redirects resolve to a final URL the engine can
//! use as the dedup key.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::types::page::FetchedPage;

/// Fetcher port for retrieving pages.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a URL, returning the rendered HTML and the final URL
    /// after redirects.
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage>;

    /// Fetcher name for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}
