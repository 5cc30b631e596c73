//! Port abstractions for external collaborators.

pub mod fetcher;
pub mod oracle;

pub use fetcher::Fetcher;
pub use oracle::{CandidateRecord, Oracle};
