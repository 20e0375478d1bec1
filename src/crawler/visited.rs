//! Visited-URL tracker: the single deduplication authority for a run

use crate::url::visit_key;
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

/// Concurrency-safe set of claimed URLs
///
/// A URL is claimed before its fetch begins, so no two workers ever fetch the
/// same URL. The set only grows for the lifetime of one crawl run.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: RwLock<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claims `url` for fetching
    ///
    /// The URL is normalized first (fragment stripped). Returns true if the
    /// caller now owns the right to fetch it, false if it was already claimed.
    pub fn try_claim(&self, url: &str) -> bool {
        let key = visit_key(url);
        self.urls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key)
    }

    /// Returns true if `url` has already been claimed
    pub fn contains(&self, url: &str) -> bool {
        let key = visit_key(url);
        self.urls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
    }

    pub fn len(&self) -> usize {
        self.urls.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
