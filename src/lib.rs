//! gongji - Korean government notice board aggregator
//!
//! Crawls the announcement boards of five agencies (관세청, 국세청,
//! 기획재정부, 통계청, 조달청) and normalizes every listing row into a
//! [`NoticeRecord`] with a title, a date and an absolute detail URL.
//!
//! # Architecture
//!
//! - [`config`] - Configuration file and environment overrides
//! - [`crawler`] - Board definitions, page fetching with retry, link resolution
//!   and the multi-board orchestrator
//! - [`parser`] - Selector-driven extraction of listing rows
//! - [`models`] - Core data structures
//! - [`cache`] - In-memory per-board crawl cache
//! - [`scheduler`] - Daily refresh trigger for the cache
//! - [`utils`] - Text, URL, encoding and retry helpers
//!
//! # Example
//!
//! ```no_run
//! use gongji::crawler::{build_adapters, CrawlOrchestrator, PageFetcher};
//! use gongji::config::Config;
//! use gongji::models::SourceId;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let fetcher = PageFetcher::with_config(config.request_timeout(), &config.crawler.user_agent)?;
//!     let adapters = build_adapters(&config.board_definitions(), &SourceId::all(), &fetcher)?;
//!     let results = CrawlOrchestrator::default().run_all(&adapters).await;
//!     for (source, crawl) in results {
//!         println!("{source}: {} notices", crawl.records.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod parser;
pub mod scheduler;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::NoticeCache;
    pub use crate::config::Config;
    pub use crate::crawler::{CrawlOrchestrator, PageFetcher, SourceAdapter, SourceConfig};
    pub use crate::error::{Error, ErrorCategory, GongjiErrorTrait, Result};
    pub use crate::models::{CrawlSummary, NoticeRecord, SourceCrawl, SourceId};
    pub use crate::scheduler::RefreshTrigger;
}

// Direct re-exports for convenience
pub use models::{NoticeRecord, SourceCrawl, SourceId};
