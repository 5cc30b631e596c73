//! Extraction oracle port.
//!
//! The oracle is an external capability (an LLM in practice) treated as
//! opaque, non-deterministic, rate-limited, and fallible. It has exactly
//! two jobs: infer a schema from a content sample, and extract one
//! candidate record from one page against a fixed schema.
//!
//! Keeping the port this narrow isolates the crawl/convert core from
//! any specific model API and makes the core testable with a
//! deterministic stub.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::OracleResult;
use crate::types::{page::RawPageRecord, schema::Schema};

/// A candidate record as the oracle produced it, before projection
/// onto the run's schema.
pub type CandidateRecord = Map<String, Value>;

/// Oracle port for schema inference and extraction.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Infer a schema from a bounded sample of captured pages.
    ///
    /// `total_pages` is the size of the full capture set, passed so the
    /// oracle knows the sample is representative rather than complete.
    async fn infer_schema(
        &self,
        sample: &[RawPageRecord],
        total_pages: usize,
    ) -> OracleResult<Schema>;

    /// Extract a candidate record from one page against the schema.
    async fn extract(&self, page: &RawPageRecord, schema: &Schema) -> OracleResult<CandidateRecord>;

    /// Provider name for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}
