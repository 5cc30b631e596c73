//! FIFO frontier with an integrated visited set.
//!
//! Breadth-first ordering guarantees that shallower pages are fetched
//! before deeper ones, so when the page budget cuts a crawl short the
//! pages closest to the seed are the ones kept.

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// One queued URL with its distance in link-hops from the seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierEntry {
    /// Absolute URL
    pub url: String,

    /// Link-hops from the seed
    pub depth: usize,
}

impl FrontierEntry {
    /// Create an entry.
    pub fn new(url: impl Into<String>, depth: usize) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

/// FIFO crawl frontier enforcing dedup and the depth bound.
///
/// A URL is "seen" once admitted and never admitted again, whether it
/// is still queued, in flight, or done. Depth admission is checked here
/// so no entry beyond `max_depth` can ever sit in the queue.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    seen: HashSet<String>,
    done: HashSet<String>,
    max_depth: usize,
}

impl Frontier {
    /// Create an empty frontier with a depth bound.
    pub fn new(max_depth: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            done: HashSet::new(),
            max_depth,
        }
    }

    /// Rebuild a frontier from persisted progress: URLs already
    /// visited plus the queued entries snapshotted at suspension.
    /// Queued entries beyond the depth bound are dropped, so resuming
    /// with a smaller `max_depth` re-tightens the bound.
    pub fn restore(
        max_depth: usize,
        visited: impl IntoIterator<Item = String>,
        queued: impl IntoIterator<Item = FrontierEntry>,
    ) -> Self {
        let mut frontier = Self::new(max_depth);
        for url in visited {
            frontier.seen.insert(url.clone());
            frontier.done.insert(url);
        }
        for entry in queued {
            if entry.depth > max_depth {
                continue;
            }
            if frontier.seen.insert(entry.url.clone()) {
                frontier.queue.push_back(entry);
            }
        }
        frontier
    }

    /// Admit a URL at a depth. Returns false (a no-op, not an error)
    /// if the URL was already admitted or the depth exceeds the bound.
    pub fn admit(&mut self, url: impl Into<String>, depth: usize) -> bool {
        if depth > self.max_depth {
            return false;
        }
        let url = url.into();
        if !self.seen.insert(url.clone()) {
            return false;
        }
        self.queue.push_back(FrontierEntry::new(url, depth));
        true
    }

    /// Pop the next entry in FIFO order.
    pub fn next(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    /// Mark a URL as fetched (or attempted); it will never be queued
    /// again within this run.
    pub fn mark_done(&mut self, url: impl Into<String>) {
        let url = url.into();
        self.seen.insert(url.clone());
        self.done.insert(url);
    }

    /// Whether this URL has already been admitted or completed.
    pub fn is_seen(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Number of queued entries.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Snapshot the queued entries for persistence, FIFO order kept.
    pub fn snapshot(&self) -> Vec<FrontierEntry> {
        self.queue.iter().cloned().collect()
    }
}
