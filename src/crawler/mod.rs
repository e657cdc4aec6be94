//! Board crawling
//!
//! This module implements the crawling core: fetching listing pages with
//! retry, turning rows into records, resolving detail links, and driving
//! several boards at once.

pub mod adapter;
pub mod fetcher;
pub mod headers;
pub mod link;
pub mod orchestrator;
pub mod source;

pub use adapter::SourceAdapter;
pub use fetcher::{FetchOutcome, PageFetcher};
pub use link::{LinkResolver, LinkStrategy};
pub use orchestrator::CrawlOrchestrator;
pub use source::SourceConfig;

use crate::models::SourceId;
use crate::utils::error::CrawlerError;

/// Build one adapter per requested board
///
/// `configs` supplies the definitions to use (built-ins, possibly replaced
/// from configuration); `sources` picks and orders them. A source without a
/// definition is a configuration error.
pub fn build_adapters(
    configs: &[SourceConfig],
    sources: &[SourceId],
    fetcher: &PageFetcher,
) -> Result<Vec<SourceAdapter>, CrawlerError> {
    sources
        .iter()
        .map(|id| {
            let config = configs
                .iter()
                .find(|c| c.id == *id)
                .cloned()
                .ok_or_else(|| CrawlerError::invalid_config(*id, "no board definition"))?;
            SourceAdapter::new(config, fetcher.clone())
        })
        .collect()
}
