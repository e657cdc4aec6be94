//! In-memory result cache for board crawls
//!
//! Holds the last crawl of each board so repeated views don't re-crawl
//! hundreds of pages. The cache never crawls by itself: callers look a board
//! up, crawl on a miss and store the result. Invalidation comes from outside,
//! typically the daily refresh trigger.
//!
//! # Example
//!
//! ```rust,ignore
//! use gongji::cache::NoticeCache;
//!
//! let cache = NoticeCache::new();
//! let crawl = cache
//!     .get_or_crawl(SourceId::Pps, || orchestrator.run_one(&adapter))
//!     .await;
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{SourceCrawl, SourceId};

/// A stored crawl and when it was stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedCrawl {
    pub crawl: SourceCrawl,
    pub cached_at: DateTime<Utc>,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Total cache hits
    pub hits: u64,
    /// Total cache misses
    pub misses: u64,
    /// Crawls stored
    pub stores: u64,
    /// Entries removed by clear or clear_all
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Per-board crawl cache
#[derive(Debug, Default)]
pub struct NoticeCache {
    entries: RwLock<HashMap<SourceId, CachedCrawl>>,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    evictions: AtomicU64,
}

impl NoticeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached crawl for `source`, counting a hit or miss
    pub async fn load(&self, source: SourceId) -> Option<CachedCrawl> {
        let entry = self.entries.read().await.get(&source).cloned();

        if entry.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(source = %source, "Notice cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(source = %source, "Notice cache miss");
        }

        entry
    }

    /// Store (or replace) the crawl for `source`
    pub async fn store(&self, source: SourceId, crawl: SourceCrawl) {
        let entry = CachedCrawl {
            crawl,
            cached_at: Utc::now(),
        };
        self.entries.write().await.insert(source, entry);
        self.stores.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop the entry for `source`; returns whether one existed
    pub async fn clear(&self, source: SourceId) -> bool {
        let removed = self.entries.write().await.remove(&source).is_some();
        if removed {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Drop every entry; returns how many were removed
    pub async fn clear_all(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        debug!(removed, "Notice cache cleared");
        removed
    }

    /// Load `source`, or run `crawl_fn` and store its result on a miss
    ///
    /// Cancelled crawls are returned but not stored.
    pub async fn get_or_crawl<F, Fut>(&self, source: SourceId, crawl_fn: F) -> SourceCrawl
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SourceCrawl>,
    {
        if let Some(cached) = self.load(source).await {
            return cached.crawl;
        }

        let crawl = crawl_fn().await;
        if !crawl.summary.cancelled {
            self.store(source, crawl.clone()).await;
        }
        crawl
    }

    /// Boards currently cached, in key order
    pub async fn cached_sources(&self) -> Vec<SourceId> {
        let mut sources: Vec<_> = self.entries.read().await.keys().copied().collect();
        sources.sort();
        sources
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
