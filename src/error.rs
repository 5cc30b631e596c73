//! Typed errors for the webdistill library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Fetch and per-page
//! extraction failures are recovered locally by the engines; schema
//! acquisition and persistence failures halt their phase.

use thiserror::Error;

/// Errors that can abort a crawl-and-convert run.
#[derive(Debug, Error)]
pub enum DistillError {
    /// Seed or configured URL could not be parsed
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Oracle call failed
    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Progress or snapshot could not be persisted
    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),

    /// No schema could be obtained, so conversion cannot proceed
    #[error("no schema available: {reason}")]
    NoSchema { reason: String },

    /// Invalid run configuration
    #[error("config error: {reason}")]
    Config { reason: String },
}

/// Errors from the fetcher port.
///
/// These are never fatal to a run: the engine records the failure
/// against the URL and continues.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, TLS, body read)
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Server answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    /// Request did not complete in time
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// URL could not be parsed
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

/// Errors from the extraction oracle port.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Provider API call failed
    #[error("API error: {0}")]
    Api(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Provider returned nothing usable
    #[error("empty response from provider")]
    EmptyResponse,

    /// Provider output was not the JSON shape asked for
    #[error("malformed response: {reason}")]
    MalformedResponse { reason: String },

    /// Extraction produced no fields from the fixed schema
    #[error("schema violation for {url}: unexpected fields {fields:?}")]
    SchemaViolation { url: String, fields: Vec<String> },

    /// Missing API key or other provider configuration
    #[error("provider config error: {reason}")]
    Config { reason: String },
}

/// Errors writing or reading persisted snapshots.
///
/// Always fatal to the phase that hit them: continuing without a
/// durable resumption point would silently lose progress.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot contents were not valid JSON for the expected type
    #[error("corrupt snapshot {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for run-level operations.
pub type Result<T> = std::result::Result<T, DistillError>;

/// Result type alias for fetcher operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for oracle operations.
pub type OracleResult<T> = std::result::Result<T, OracleError>;

/// Result type alias for persistence operations.
pub type PersistResult<T> = std::result::Result<T, PersistError>;
