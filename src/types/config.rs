//! Run configuration types.
//!
//! Produced by whatever front end drives the library; the core only
//! consumes these values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{DistillError, Result};

/// Configuration for the crawl phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Starting URL
    pub seed_url: String,

    /// Maximum link-hops from the seed (0 = seed only)
    pub max_depth: usize,

    /// Maximum number of fetch attempts for the run
    pub max_pages: usize,

    /// Minimum interval between successive fetches
    #[serde(with = "duration_secs")]
    pub delay: Duration,

    /// Restrict crawling to the seed's host
    pub same_domain: bool,

    /// URLs must contain one of these substrings (empty = no restriction)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// URLs containing any of these substrings are rejected
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl CrawlConfig {
    /// Create a config with conservative defaults.
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            max_depth: 3,
            max_pages: 100,
            delay: Duration::from_secs(1),
            same_domain: true,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }

    /// Set the maximum crawl depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the page budget.
    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    /// Set the minimum inter-request interval.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Allow or forbid crawling outside the seed's host.
    pub fn with_same_domain(mut self, same_domain: bool) -> Self {
        self.same_domain = same_domain;
        self
    }

    /// Add an include pattern (plain substring).
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include_patterns.push(pattern.into());
        self
    }

    /// Add an exclude pattern (plain substring).
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Validate budget constraints.
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(DistillError::Config {
                reason: "max_pages must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration for the conversion phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Minimum interval between oracle calls
    #[serde(with = "duration_secs")]
    pub conversion_delay: Duration,

    /// Records per persisted batch
    pub batch_size: usize,

    /// Reuse a previously persisted schema instead of inferring one
    #[serde(default)]
    pub reuse_schema_path: Option<PathBuf>,

    /// Pages of the sample handed to the oracle for schema inference
    pub sample_size: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            conversion_delay: Duration::from_secs(2),
            batch_size: 5,
            reuse_schema_path: None,
            sample_size: 5,
        }
    }
}

impl ConvertConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum interval between oracle calls.
    pub fn with_conversion_delay(mut self, delay: Duration) -> Self {
        self.conversion_delay = delay;
        self
    }

    /// Set the persisted batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Reuse the schema persisted at this path.
    pub fn with_reuse_schema(mut self, path: impl Into<PathBuf>) -> Self {
        self.reuse_schema_path = Some(path.into());
        self
    }
}

/// Full run configuration: crawl, convert, and output placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Crawl phase settings
    pub crawl: CrawlConfig,

    /// Conversion phase settings
    pub convert: ConvertConfig,

    /// Directory for persisted snapshots
    pub output_dir: PathBuf,

    /// Crawl and save raw data only, skipping the oracle entirely
    #[serde(default)]
    pub skip_conversion: bool,
}

impl RunConfig {
    /// Create a run config for a seed URL and output directory.
    pub fn new(seed_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            crawl: CrawlConfig::new(seed_url),
            convert: ConvertConfig::default(),
            output_dir: output_dir.into(),
            skip_conversion: false,
        }
    }

    /// Replace the crawl settings.
    pub fn with_crawl(mut self, crawl: CrawlConfig) -> Self {
        self.crawl = crawl;
        self
    }

    /// Replace the conversion settings.
    pub fn with_convert(mut self, convert: ConvertConfig) -> Self {
        self.convert = convert;
        self
    }

    /// Skip the conversion phase.
    pub fn skip_conversion(mut self) -> Self {
        self.skip_conversion = true;
        self
    }
}

/// Serialize durations as seconds, the unit configuration files use.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}
