//! Conversion phase: schema acquisition and schema-consistent
//! extraction of structured records from captured pages.

pub mod converter;
pub mod coordinator;
pub mod prompts;

pub use converter::{ConvertReport, Converter};
pub use coordinator::SchemaCoordinator;
