//! Schema-consistent conversion of captured pages.
//!
//! Streams raw page records through the oracle one at a time against
//! the run's fixed schema, checkpointing progress after every batch so
//! an interrupted conversion resumes without re-invoking the oracle on
//! already-converted pages.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::crawl::engine::Pacer;
use crate::error::{OracleError, Result};
use crate::store::DataStore;
use crate::traits::oracle::{CandidateRecord, Oracle};
use crate::types::{
    config::ConvertConfig,
    page::RawPageRecord,
    progress::{ConversionFailure, ConversionProgress},
    schema::{RecordMetadata, Schema, StructuredRecord},
};

/// Totals for a completed conversion, including resumed work.
#[derive(Debug, Clone)]
pub struct ConvertReport {
    /// Structured records in the final progress snapshot
    pub records_converted: usize,

    /// Pages given up on after the retry
    pub records_failed: usize,
}

/// Converter applying the oracle to each captured page.
///
/// Exclusively owns [`ConversionProgress`] for the duration of a run.
/// A page that fails persistently is recorded in the error list and
/// never re-processed, mirroring the crawl engine's mark-done policy.
pub struct Converter<'a, O: Oracle + ?Sized> {
    oracle: &'a O,
    config: ConvertConfig,
    store: &'a DataStore,
}

impl<'a, O: Oracle + ?Sized> Converter<'a, O> {
    /// Create a converter for one run.
    pub fn new(oracle: &'a O, config: ConvertConfig, store: &'a DataStore) -> Self {
        Self {
            oracle,
            config,
            store,
        }
    }

    /// Convert every page not already in the persisted progress.
    ///
    /// Oracle calls are paced by `conversion_delay`. Each candidate is
    /// projected onto the schema: extra fields are dropped, missing
    /// fields null-filled. A candidate sharing no fields with the
    /// schema counts as a violation and is retried once, then recorded
    /// as a failure.
    pub async fn convert_all(
        &self,
        pages: &[RawPageRecord],
        schema: &Schema,
        run_label: &str,
    ) -> Result<ConvertReport> {
        let mut progress = self
            .store
            .load_conversion_progress()?
            .unwrap_or_else(ConversionProgress::new);

        let pending = pages
            .iter()
            .filter(|p| !progress.is_done(&p.source_url))
            .count();
        info!(
            total = pages.len(),
            pending,
            already_converted = progress.structured_records.len(),
            provider = self.oracle.name(),
            "conversion starting"
        );

        let mut pacer = Pacer::new(self.config.conversion_delay);
        let mut since_checkpoint = 0usize;

        for page in pages {
            if progress.is_done(&page.source_url) {
                continue;
            }

            match self.convert_page(page, schema, &mut pacer).await {
                Ok(record) => {
                    progress.structured_records.push(record);
                    debug!(url = %page.source_url, "page converted");
                }
                Err(e) => {
                    warn!(url = %page.source_url, error = %e, "conversion failed after retry");
                    progress.errors.push(ConversionFailure {
                        url: page.source_url.clone(),
                        error: e.to_string(),
                    });
                }
            }

            // Done either way; failures are never re-processed
            progress.converted_urls.insert(page.source_url.clone());
            since_checkpoint += 1;

            if since_checkpoint >= self.config.batch_size {
                self.checkpoint(&progress, run_label)?;
                since_checkpoint = 0;
                info!(
                    converted = progress.structured_records.len(),
                    failed = progress.errors.len(),
                    "conversion checkpoint persisted"
                );
            }
        }

        self.checkpoint(&progress, run_label)?;
        info!(
            converted = progress.structured_records.len(),
            failed = progress.errors.len(),
            "conversion finished"
        );

        Ok(ConvertReport {
            records_converted: progress.structured_records.len(),
            records_failed: progress.errors.len(),
        })
    }

    /// One page through the oracle, with a single retry on failure or
    /// schema-violating output.
    async fn convert_page(
        &self,
        page: &RawPageRecord,
        schema: &Schema,
        pacer: &mut Pacer,
    ) -> std::result::Result<StructuredRecord, OracleError> {
        let first = self.attempt(page, schema, pacer).await;
        let fields = match first {
            Ok(fields) => fields,
            Err(e) => {
                debug!(url = %page.source_url, error = %e, "retrying conversion once");
                self.attempt(page, schema, pacer).await?
            }
        };

        Ok(StructuredRecord {
            fields,
            metadata: RecordMetadata {
                source_url: page.source_url.clone(),
                title: page.title.clone(),
                url_hash: page.url_hash.clone(),
                fetched_at: page.fetched_at,
            },
        })
    }

    async fn attempt(
        &self,
        page: &RawPageRecord,
        schema: &Schema,
        pacer: &mut Pacer,
    ) -> std::result::Result<IndexMap<String, Value>, OracleError> {
        pacer.pace().await;
        let candidate = self.oracle.extract(page, schema).await?;
        project_onto_schema(candidate, schema, &page.source_url)
    }

    fn checkpoint(&self, progress: &ConversionProgress, run_label: &str) -> Result<()> {
        self.store.save_conversion_progress(progress)?;
        self.store
            .save_structured_records(run_label, &progress.structured_records)?;
        Ok(())
    }
}

/// Project a candidate onto the schema's field set.
///
/// The output carries exactly the schema's fields in schema order:
/// extra candidate fields are dropped (the schema never grows mid-run)
/// and absent fields become null. A candidate with no schema fields at
/// all is a violation, not a record of nulls.
fn project_onto_schema(
    mut candidate: CandidateRecord,
    schema: &Schema,
    url: &str,
) -> std::result::Result<IndexMap<String, Value>, OracleError> {
    let matched = schema
        .fields
        .keys()
        .filter(|name| candidate.contains_key(name.as_str()))
        .count();

    if matched == 0 && !schema.is_empty() {
        return Err(OracleError::SchemaViolation {
            url: url.to_string(),
            fields: candidate.keys().cloned().collect(),
        });
    }

    let mut fields = IndexMap::with_capacity(schema.fields.len());
    for name in schema.fields.keys() {
        let value = candidate.remove(name.as_str()).unwrap_or(Value::Null);
        fields.insert(name.clone(), value);
    }

    if !candidate.is_empty() {
        debug!(
            url = %url,
            dropped = ?candidate.keys().collect::<Vec<_>>(),
            "dropped fields outside the schema"
        );
    }

    Ok(fields)
}
