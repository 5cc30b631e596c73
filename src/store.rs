//! On-disk snapshot store for resumable runs.
//!
//! Every persisted state is a plain JSON snapshot rewritten whole via
//! write-temp-then-rename, so a crash mid-write leaves the previous
//! snapshot intact. Both engines treat a failed write as fatal rather
//! than continue with an unresumable run.

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{PersistError, PersistResult};
use crate::types::{
    progress::{ConversionProgress, CrawlProgress},
    page::RawPageRecord,
    schema::{Schema, StructuredRecord},
};

const CRAWL_PROGRESS_FILE: &str = "crawl_progress.json";
const SCRAPED_DATA_FILE: &str = "scraped_data.json";
const SCHEMA_FILE: &str = "schema_analysis.json";
const CONVERSION_PROGRESS_FILE: &str = "conversion_progress.json";

/// Snapshot store rooted at one output directory.
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    /// Open a store, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> PersistResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| PersistError::Io {
            path: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the persisted schema snapshot.
    pub fn schema_path(&self) -> PathBuf {
        self.root.join(SCHEMA_FILE)
    }

    /// Persist crawl progress.
    pub fn save_crawl_progress(&self, progress: &CrawlProgress) -> PersistResult<()> {
        self.save_json(CRAWL_PROGRESS_FILE, progress)
    }

    /// Load crawl progress from a prior run, if any.
    pub fn load_crawl_progress(&self) -> PersistResult<Option<CrawlProgress>> {
        self.load_json(CRAWL_PROGRESS_FILE)
    }

    /// Persist the full raw page set.
    pub fn save_raw_pages(&self, pages: &[RawPageRecord]) -> PersistResult<()> {
        self.save_json(SCRAPED_DATA_FILE, &pages)
    }

    /// Load the raw page set from a prior run, if any.
    pub fn load_raw_pages(&self) -> PersistResult<Option<Vec<RawPageRecord>>> {
        self.load_json(SCRAPED_DATA_FILE)
    }

    /// Persist the run's schema analysis.
    pub fn save_schema(&self, schema: &Schema) -> PersistResult<()> {
        self.save_json(SCHEMA_FILE, schema)
    }

    /// Load a schema from an arbitrary path, accepting either a full
    /// analysis snapshot or a bare field map.
    pub fn load_schema_from(path: &Path) -> PersistResult<Schema> {
        let text = fs::read_to_string(path).map_err(|source| PersistError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match serde_json::from_str::<Schema>(&text) {
            Ok(schema) if !schema.is_empty() => Ok(schema),
            _ => {
                let fields = serde_json::from_str(&text).map_err(|source| PersistError::Corrupt {
                    path: path.display().to_string(),
                    source,
                })?;
                Ok(Schema::from_fields(fields))
            }
        }
    }

    /// Persist conversion progress.
    pub fn save_conversion_progress(&self, progress: &ConversionProgress) -> PersistResult<()> {
        self.save_json(CONVERSION_PROGRESS_FILE, progress)
    }

    /// Load conversion progress from a prior run, if any.
    pub fn load_conversion_progress(&self) -> PersistResult<Option<ConversionProgress>> {
        self.load_json(CONVERSION_PROGRESS_FILE)
    }

    /// Persist the structured record array under a run label.
    pub fn save_structured_records(
        &self,
        run_label: &str,
        records: &[StructuredRecord],
    ) -> PersistResult<()> {
        self.save_json(&format!("structured_data_{run_label}.json"), &records)
    }

    fn save_json<T: Serialize>(&self, name: &str, value: &T) -> PersistResult<()> {
        let path = self.root.join(name);
        let tmp = self.root.join(format!("{name}.tmp"));

        let json = serde_json::to_vec_pretty(value).map_err(|source| PersistError::Corrupt {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(&tmp, json).map_err(|source| PersistError::Io {
            path: tmp.display().to_string(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| PersistError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "snapshot persisted");
        Ok(())
    }

    fn load_json<T: DeserializeOwned>(&self, name: &str) -> PersistResult<Option<T>> {
        let path = self.root.join(name);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let value = serde_json::from_str(&text).map_err(|source| PersistError::Corrupt {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(value))
    }
}
