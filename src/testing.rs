//! Mock implementations of the fetcher and oracle ports.
//!
//! Deterministic, configurable stand-ins so crawl and conversion logic
//! can be exercised without network or model calls.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::error::{FetchError, FetchResult, OracleError, OracleResult};
use crate::traits::{
    fetcher::Fetcher,
    oracle::{CandidateRecord, Oracle},
};
use crate::types::{
    page::{FetchedPage, RawPageRecord},
    schema::Schema,
};

/// Build a minimal HTML document with a title and links, for seeding
/// mock sites.
pub fn page_html(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{href}\">{href}</a>\n"))
        .collect();
    format!(
        "<html><head><title>{title}</title></head>\
         <body><h1>{title}</h1><p>Content of {title}.</p>\n{anchors}</body></html>"
    )
}

/// Mock fetcher serving canned HTML per URL.
#[derive(Default)]
pub struct MockFetcher {
    pages: Arc<RwLock<HashMap<String, String>>>,
    redirects: Arc<RwLock<HashMap<String, String>>>,
    failures: Arc<RwLock<HashSet<String>>>,
    fetch_calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this HTML for this URL.
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), html.into());
        self
    }

    /// Redirect one URL to another; the target's HTML is served.
    pub fn with_redirect(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.redirects.write().unwrap().insert(from.into(), to.into());
        self
    }

    /// Fail every fetch of this URL.
    pub fn with_failure(self, url: impl Into<String>) -> Self {
        self.failures.write().unwrap().insert(url.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.read().unwrap().clone()
    }

    /// Number of fetches issued.
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_calls.read().unwrap().len()
    }
}

impl Clone for MockFetcher {
    fn clone(&self) -> Self {
        Self {
            pages: Arc::clone(&self.pages),
            redirects: Arc::clone(&self.redirects),
            failures: Arc::clone(&self.failures),
            fetch_calls: Arc::clone(&self.fetch_calls),
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        self.fetch_calls.write().unwrap().push(url.to_string());

        if self.failures.read().unwrap().contains(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 500,
            });
        }

        let final_url = self
            .redirects
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());

        let html = self.pages.read().unwrap().get(&final_url).cloned();
        match html {
            Some(html) => Ok(FetchedPage::new(html, final_url)),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock oracle with a canned schema and per-URL canned candidates.
///
/// By default, extraction fills every schema field with the page title,
/// which is deterministic and schema-conforming. Failure injection
/// covers the retry paths: each configured failure count is consumed
/// one call at a time before the canned response takes over.
#[derive(Default)]
pub struct MockOracle {
    schema: Arc<RwLock<Option<Schema>>>,
    records: Arc<RwLock<HashMap<String, CandidateRecord>>>,
    extract_failures: Arc<RwLock<HashMap<String, usize>>>,
    fail_inference: Arc<RwLock<bool>>,
    infer_calls: Arc<RwLock<usize>>,
    extract_calls: Arc<RwLock<Vec<String>>>,
}

impl MockOracle {
    /// Create a mock that infers a one-field `title` schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Infer this schema instead of the default.
    pub fn with_schema(self, schema: Schema) -> Self {
        *self.schema.write().unwrap() = Some(schema);
        self
    }

    /// Return this candidate for this URL.
    pub fn with_record(self, url: impl Into<String>, record: CandidateRecord) -> Self {
        self.records.write().unwrap().insert(url.into(), record);
        self
    }

    /// Fail the next `count` extractions for this URL.
    pub fn with_extract_failures(self, url: impl Into<String>, count: usize) -> Self {
        self.extract_failures.write().unwrap().insert(url.into(), count);
        self
    }

    /// Fail all schema inference calls.
    pub fn with_inference_failure(self) -> Self {
        *self.fail_inference.write().unwrap() = true;
        self
    }

    /// Number of inference calls made.
    pub fn infer_calls(&self) -> usize {
        *self.infer_calls.read().unwrap()
    }

    /// URLs extracted so far, in order (retries appear twice).
    pub fn extract_calls(&self) -> Vec<String> {
        self.extract_calls.read().unwrap().clone()
    }

    /// Number of extraction calls made.
    pub fn extract_call_count(&self) -> usize {
        self.extract_calls.read().unwrap().len()
    }
}

impl Clone for MockOracle {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            records: Arc::clone(&self.records),
            extract_failures: Arc::clone(&self.extract_failures),
            fail_inference: Arc::clone(&self.fail_inference),
            infer_calls: Arc::clone(&self.infer_calls),
            extract_calls: Arc::clone(&self.extract_calls),
        }
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn infer_schema(
        &self,
        _sample: &[RawPageRecord],
        _total_pages: usize,
    ) -> OracleResult<Schema> {
        *self.infer_calls.write().unwrap() += 1;

        if *self.fail_inference.read().unwrap() {
            return Err(OracleError::Api("mock inference failure".into()));
        }

        Ok(self
            .schema
            .read()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Schema::new("mock content").with_field("title", "string")))
    }

    async fn extract(&self, page: &RawPageRecord, schema: &Schema) -> OracleResult<CandidateRecord> {
        self.extract_calls
            .write()
            .unwrap()
            .push(page.source_url.clone());

        {
            let mut failures = self.extract_failures.write().unwrap();
            if let Some(remaining) = failures.get_mut(&page.source_url) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(OracleError::Api("mock extraction failure".into()));
                }
            }
        }

        if let Some(record) = self.records.read().unwrap().get(&page.source_url) {
            return Ok(record.clone());
        }

        let mut candidate = CandidateRecord::new();
        for name in schema.fields.keys() {
            candidate.insert(name.clone(), Value::String(page.title.clone()));
        }
        Ok(candidate)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
