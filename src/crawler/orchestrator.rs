//! Multi-board crawl driver
//!
//! Boards are crawled concurrently up to a configured limit; pages within a
//! board stay sequential inside its [`SourceAdapter`].

use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::crawler::adapter::SourceAdapter;
use crate::models::{SourceCrawl, SourceId};

/// Default number of boards crawled at once
pub const DEFAULT_MAX_CONCURRENT_SOURCES: usize = 5;

/// Drives [`SourceAdapter`]s and collects their results
#[derive(Debug, Clone)]
pub struct CrawlOrchestrator {
    max_concurrent_sources: usize,
    cancel: CancellationToken,
}

impl Default for CrawlOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT_SOURCES, CancellationToken::new())
    }
}

impl CrawlOrchestrator {
    /// Create an orchestrator; a limit of 0 is treated as 1
    pub fn new(max_concurrent_sources: usize, cancel: CancellationToken) -> Self {
        Self {
            max_concurrent_sources: max_concurrent_sources.max(1),
            cancel,
        }
    }

    /// Token shared with every adapter run by this orchestrator
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Crawl a single board
    pub async fn run_one(&self, adapter: &SourceAdapter) -> SourceCrawl {
        let started = Instant::now();
        let crawl = adapter.crawl(&self.cancel).await;
        log_summary(adapter.id(), &crawl, started);
        crawl
    }

    /// Crawl every board, keyed by source
    ///
    /// If the same source appears twice, the later adapter's result wins.
    pub async fn run_all(&self, adapters: &[SourceAdapter]) -> BTreeMap<SourceId, SourceCrawl> {
        info!(
            sources = adapters.len(),
            max_concurrent = self.max_concurrent_sources,
            "Starting crawl of all sources"
        );

        let mut results: Vec<(usize, SourceId, SourceCrawl)> =
            stream::iter(adapters.iter().enumerate())
                .map(|(index, adapter)| async move {
                    (index, adapter.id(), self.run_one(adapter).await)
                })
                .buffer_unordered(self.max_concurrent_sources)
                .collect()
                .await;
        results.sort_by_key(|(index, _, _)| *index);

        let crawls: BTreeMap<_, _> = results
            .into_iter()
            .map(|(_, id, crawl)| (id, crawl))
            .collect();

        let total: usize = crawls.values().map(|c| c.records.len()).sum();
        info!(sources = crawls.len(), records = total, "Crawl of all sources finished");

        crawls
    }
}

fn log_summary(source: SourceId, crawl: &SourceCrawl, started: Instant) {
    let summary = &crawl.summary;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if summary.is_degraded() || summary.cancelled {
        warn!(
            source = %source,
            pages_attempted = summary.pages_attempted,
            pages_succeeded = summary.pages_succeeded,
            pages_skipped = summary.pages_skipped,
            pages_empty = summary.pages_empty,
            records = summary.records_harvested,
            cancelled = summary.cancelled,
            elapsed_ms,
            "Source crawl finished with gaps"
        );
    } else {
        info!(
            source = %source,
            pages_attempted = summary.pages_attempted,
            pages_empty = summary.pages_empty,
            records = summary.records_harvested,
            elapsed_ms,
            "Source crawl finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::PageFetcher;
    use crate::crawler::source::SourceConfig;

    #[test]
    fn test_zero_concurrency_clamped() {
        let orchestrator = CrawlOrchestrator::new(0, CancellationToken::new());
        assert_eq!(orchestrator.max_concurrent_sources, 1);
    }

    #[tokio::test]
    async fn test_cancelled_run_all_returns_every_source() {
        let fetcher = PageFetcher::new().unwrap();
        let adapters: Vec<_> = SourceConfig::builtins()
            .into_iter()
            .map(|c| SourceAdapter::new(c, fetcher.clone()).unwrap())
            .collect();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let orchestrator = CrawlOrchestrator::new(2, cancel);

        let results = orchestrator.run_all(&adapters).await;
        assert_eq!(results.keys().copied().collect::<Vec<_>>(), SourceId::all());
        assert!(results.values().all(|c| c.summary.cancelled && c.records.is_empty()));
    }
}
