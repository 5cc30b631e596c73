//! Schema acquisition for a conversion run.

use std::path::Path;
use tracing::{info, warn};

use crate::error::{DistillError, Result};
use crate::store::DataStore;
use crate::traits::oracle::Oracle;
use crate::types::{config::ConvertConfig, page::RawPageRecord, schema::Schema};

/// Obtains the run's schema: reused from a prior run, or inferred once
/// from a bounded sample and persisted immediately.
///
/// Whichever way it was obtained, the schema is immutable for the
/// lifetime of the run. No field is added, removed, or retyped mid-run
/// even when later pages would suggest a better fit; consistency takes
/// precedence over fit.
pub struct SchemaCoordinator<'a, O: Oracle + ?Sized> {
    oracle: &'a O,
    store: &'a DataStore,
}

impl<'a, O: Oracle + ?Sized> SchemaCoordinator<'a, O> {
    /// Create a coordinator.
    pub fn new(oracle: &'a O, store: &'a DataStore) -> Self {
        Self { oracle, store }
    }

    /// Obtain the schema for this run.
    ///
    /// A reused schema is returned unchanged with no oracle call, and
    /// is authoritative even if it disagrees with the shape of the new
    /// content. An unreadable reuse file falls back to inference with a
    /// warning rather than aborting.
    pub async fn obtain_schema(
        &self,
        pages: &[RawPageRecord],
        config: &ConvertConfig,
    ) -> Result<Schema> {
        if let Some(path) = &config.reuse_schema_path {
            match self.load_reused(path) {
                Some(schema) => return Ok(schema),
                None => warn!(path = %path.display(), "schema reuse failed, inferring instead"),
            }
        }

        if pages.is_empty() {
            return Err(DistillError::NoSchema {
                reason: "no captured pages to infer a schema from".to_string(),
            });
        }

        let sample_len = config.sample_size.min(pages.len());
        info!(
            sample = sample_len,
            total = pages.len(),
            provider = self.oracle.name(),
            "inferring schema from sample"
        );

        let schema = self.oracle.infer_schema(&pages[..sample_len], pages.len()).await?;

        if schema.is_empty() {
            return Err(DistillError::NoSchema {
                reason: "oracle analysis produced no fields".to_string(),
            });
        }

        // Persisted before any conversion so a later run can reuse it
        self.store.save_schema(&schema)?;
        info!(
            content_type = %schema.content_type,
            fields = schema.fields.len(),
            "schema inferred and persisted"
        );

        Ok(schema)
    }

    fn load_reused(&self, path: &Path) -> Option<Schema> {
        match DataStore::load_schema_from(path) {
            Ok(schema) if !schema.is_empty() => {
                info!(
                    path = %path.display(),
                    content_type = %schema.content_type,
                    fields = schema.fields.len(),
                    "reusing persisted schema"
                );
                Some(schema)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load schema file");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockOracle;
    use crate::types::config::ConvertConfig;

    fn page(url: &str) -> RawPageRecord {
        RawPageRecord::new(url, "some page text")
    }

    #[tokio::test]
    async fn test_infers_and_persists_schema() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::open(dir.path()).unwrap();
        let oracle =
            MockOracle::new().with_schema(Schema::new("docs").with_field("title", "string"));

        let coordinator = SchemaCoordinator::new(&oracle, &store);
        let pages = vec![page("https://example.com/a"), page("https://example.com/b")];
        let schema = coordinator
            .obtain_schema(&pages, &ConvertConfig::default())
            .await
            .unwrap();

        assert_eq!(schema.content_type, "docs");
        assert_eq!(oracle.infer_calls(), 1);
        // Persisted for future reuse
        assert!(store.schema_path().exists());
    }

    #[tokio::test]
    async fn test_reuse_makes_no_oracle_call() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::open(dir.path()).unwrap();
        store
            .save_schema(&Schema::new("listings").with_field("name", "string"))
            .unwrap();

        let oracle = MockOracle::new();
        let coordinator = SchemaCoordinator::new(&oracle, &store);
        let config = ConvertConfig::default().with_reuse_schema(store.schema_path());

        let schema = coordinator
            .obtain_schema(&[page("https://example.com")], &config)
            .await
            .unwrap();

        assert_eq!(schema.content_type, "listings");
        assert_eq!(oracle.infer_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_reuse_file_falls_back_to_inference() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::open(dir.path()).unwrap();
        let oracle = MockOracle::new().with_schema(Schema::new("docs").with_field("a", "string"));

        let coordinator = SchemaCoordinator::new(&oracle, &store);
        let config = ConvertConfig::default().with_reuse_schema(dir.path().join("missing.json"));

        let schema = coordinator
            .obtain_schema(&[page("https://example.com")], &config)
            .await
            .unwrap();
        assert_eq!(schema.content_type, "docs");
        assert_eq!(oracle.infer_calls(), 1);
    }

    #[tokio::test]
    async fn test_no_pages_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::open(dir.path()).unwrap();
        let oracle = MockOracle::new();

        let coordinator = SchemaCoordinator::new(&oracle, &store);
        let result = coordinator.obtain_schema(&[], &ConvertConfig::default()).await;
        assert!(matches!(result, Err(DistillError::NoSchema { .. })));
    }
}
