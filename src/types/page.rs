//! Raw page capture types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// One successfully fetched page, immutable once created.
///
/// Keyed by `source_url` (the final URL after redirects), at most one
/// record per URL per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPageRecord {
    /// Final URL the page was fetched from (dedup key)
    pub source_url: String,

    /// Stable hex hash of `source_url`, used to key derived artifacts
    pub url_hash: String,

    /// Page title, empty if the document had none
    #[serde(default)]
    pub title: String,

    /// Visible text content with markup stripped
    pub main_text: String,

    /// Heading texts in document order
    #[serde(default)]
    pub headings: Vec<String>,

    /// Tables as rows of cell texts, in document order
    #[serde(default)]
    pub tables: Vec<Vec<Vec<String>>>,

    /// Absolute URLs linked from this page
    #[serde(default)]
    pub outbound_links: BTreeSet<String>,

    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
}

impl RawPageRecord {
    /// Create a record with empty structure, hashing the URL.
    pub fn new(source_url: impl Into<String>, main_text: impl Into<String>) -> Self {
        let source_url = source_url.into();
        Self {
            url_hash: url_hash(&source_url),
            source_url,
            title: String::new(),
            main_text: main_text.into(),
            headings: Vec::new(),
            tables: Vec::new(),
            outbound_links: BTreeSet::new(),
            fetched_at: Utc::now(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the fetched timestamp.
    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }

    /// Check whether any visible text survived extraction.
    pub fn has_content(&self) -> bool {
        !self.main_text.trim().is_empty()
    }
}

/// Stable hex hash for a URL.
pub fn url_hash(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Output of the fetcher port: rendered HTML plus the redirect-resolved
/// final URL, which the engine uses as the dedup key.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Rendered HTML body
    pub html: String,

    /// URL the response actually came from, after redirects
    pub final_url: String,
}

impl FetchedPage {
    /// Create a fetched page.
    pub fn new(html: impl Into<String>, final_url: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            final_url: final_url.into(),
        }
    }
}
