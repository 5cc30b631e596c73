//! Crawl phase: frontier management, URL filtering, HTML capture, and
//! the budget-bounded engine that drives them.

pub mod engine;
pub mod extract;
pub mod filter;
pub mod frontier;

pub use engine::{CrawlEngine, CrawlReport};
pub use filter::UrlFilter;
pub use frontier::{Frontier, FrontierEntry};
