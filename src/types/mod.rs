//! Core data types for crawling and conversion.

pub mod config;
pub mod page;
pub mod progress;
pub mod schema;

pub use config::{ConvertConfig, CrawlConfig, RunConfig};
pub use page::{url_hash, FetchedPage, RawPageRecord};
pub use progress::{
    ConversionFailure, ConversionProgress, CrawlOutcome, CrawlProgress, RunSummary,
};
pub use schema::{RecordMetadata, Schema, StructuredRecord};
