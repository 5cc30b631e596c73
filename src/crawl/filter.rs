//! Per-URL accept/reject decisions.

use url::Url;

use crate::types::config::CrawlConfig;

/// File extensions that never carry crawlable page content.
const SKIP_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".css", ".js", ".zip", ".exe",
];

/// Accept/reject filter applied to every discovered link.
///
/// Patterns are plain substrings matched against the whole URL string,
/// not globs or regexes, which keeps matching deterministic and
/// independent of escaping rules. Exclude patterns always win over
/// include patterns. The seed URL itself is admitted by the engine
/// without consulting this filter.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    same_domain: bool,
    seed_host: String,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl UrlFilter {
    /// Build a filter from crawl config, capturing the seed's host.
    pub fn new(config: &CrawlConfig, seed_host: impl Into<String>) -> Self {
        Self {
            same_domain: config.same_domain,
            seed_host: seed_host.into(),
            include_patterns: config.include_patterns.clone(),
            exclude_patterns: config.exclude_patterns.clone(),
        }
    }

    /// Decide whether a discovered URL is in scope.
    ///
    /// Decision order: domain restriction, include patterns, exclude
    /// patterns, then the static-asset extension skip list.
    pub fn should_crawl(&self, url: &Url) -> bool {
        if self.same_domain && url.host_str().unwrap_or("") != self.seed_host {
            return false;
        }

        let url_str = url.as_str();

        if !self.include_patterns.is_empty()
            && !self.include_patterns.iter().any(|p| url_str.contains(p))
        {
            return false;
        }

        if self.exclude_patterns.iter().any(|p| url_str.contains(p)) {
            return false;
        }

        let lower = url_str.to_ascii_lowercase();
        if SKIP_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            return false;
        }

        true
    }
}
