//! Schema and structured record types.
//!
//! A [`Schema`] is established once per run, either inferred by the
//! oracle from a content sample or reloaded from a previous run, and is
//! never mutated afterward. That immutability is what makes structured
//! output from multiple runs mergeable.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Run-scoped field contract all structured records conform to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    /// Human description of the content type (e.g. "medical listings")
    #[serde(default)]
    pub content_type: String,

    /// Entity types the oracle identified in the sample
    #[serde(default)]
    pub entities: Vec<String>,

    /// Field name → declared type tag, in declaration order
    #[serde(default)]
    pub fields: IndexMap<String, String>,

    /// Fields worth indexing when the output is loaded into a database
    #[serde(default, rename = "indexes")]
    pub recommended_indexes: Vec<String>,

    /// Free-form observations from the analysis
    #[serde(default)]
    pub notes: String,
}

impl Schema {
    /// Create an empty schema with a content type description.
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            entities: Vec::new(),
            fields: IndexMap::new(),
            recommended_indexes: Vec::new(),
            notes: String::new(),
        }
    }

    /// Add a field with a type tag.
    pub fn with_field(mut self, name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        self.fields.insert(name.into(), type_tag.into());
        self
    }

    /// Add an entity type.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entities.push(entity.into());
        self
    }

    /// Add a recommended index field.
    pub fn with_index(mut self, field: impl Into<String>) -> Self {
        self.recommended_indexes.push(field.into());
        self
    }

    /// Wrap a bare field map, as when a reused schema file holds only
    /// the fields object rather than a full analysis.
    pub fn from_fields(fields: IndexMap<String, String>) -> Self {
        Self {
            content_type: "provided schema".to_string(),
            entities: Vec::new(),
            fields,
            recommended_indexes: Vec::new(),
            notes: "schema provided for consistent parsing".to_string(),
        }
    }

    /// Check whether the schema declares any fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Provenance attached to every structured record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// URL the record was extracted from
    pub source_url: String,

    /// Title of the source page
    #[serde(default)]
    pub title: String,

    /// Stable hash of the source URL
    pub url_hash: String,

    /// When the source page was fetched
    pub fetched_at: DateTime<Utc>,
}

/// One schema-conforming record produced from exactly one raw page.
///
/// `fields` holds exactly the schema's field names in schema order:
/// extra fields the oracle invented are dropped and fields it could not
/// fill are null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredRecord {
    /// Field values in schema declaration order
    pub fields: IndexMap<String, Value>,

    /// Source provenance
    #[serde(rename = "_metadata")]
    pub metadata: RecordMetadata,
}

impl StructuredRecord {
    /// Look up a field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
