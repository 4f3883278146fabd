//! Memoizing, trailing-debounced wrapper around a lookup service
//!
//! Rapid keystrokes produce a burst of lookups. Each call waits out the
//! debounce window; if another call arrived meanwhile, the earlier one is
//! superseded and resolves to `None` without touching the network. Results
//! are memoized per (query, options) so repeated queries are free.

use crate::lookup::{LookupOptions, TerminologyLookup};
use dashmap::DashMap;
use qedit_core::Coding;
use qedit_core::config::TerminologyConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    options: LookupOptions,
}

pub struct CachedLookup<L> {
    inner: L,
    memo: DashMap<CacheKey, Vec<Coding>>,
    latest: AtomicU64,
    debounce: Duration,
    memoize: bool,
}

impl<L: TerminologyLookup> CachedLookup<L> {
    pub fn new(inner: L, debounce: Duration) -> Self {
        Self {
            inner,
            memo: DashMap::new(),
            latest: AtomicU64::new(0),
            debounce,
            memoize: true,
        }
    }

    pub fn from_config(inner: L, config: &TerminologyConfig) -> Self {
        let mut cached = Self::new(inner, Duration::from_millis(config.debounce_ms));
        cached.memoize = config.cache;
        cached
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Number of memoized queries
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    pub fn clear(&self) {
        self.memo.clear();
    }

    /// Look up `query`, or `None` when a newer call superseded this one
    ///
    /// Failures resolve to an empty list and are not memoized.
    pub async fn lookup(&self, query: &str, options: &LookupOptions) -> Option<Vec<Coding>> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let key = CacheKey {
            query: query.trim().to_string(),
            options: options.clone(),
        };
        if key.query.is_empty() {
            return Some(Vec::new());
        }
        if let Some(hit) = self.memo.get(&key) {
            trace!(query = %key.query, "Lookup cache hit");
            return Some(hit.clone());
        }

        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
            if self.latest.load(Ordering::SeqCst) != ticket {
                debug!(query = %key.query, "Lookup superseded");
                return None;
            }
        }

        match self.inner.search(&key.query, options).await {
            Ok(codings) => {
                if self.memoize {
                    self.memo.insert(key, codings.clone());
                }
                Some(codings)
            }
            Err(e) => {
                warn!(service = self.inner.name(), "Lookup for '{}' failed: {}", key.query, e);
                Some(Vec::new())
            }
        }
    }
}
