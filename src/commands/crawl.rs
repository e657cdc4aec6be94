use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use gongji::config::Config;
use gongji::crawler::{build_adapters, CrawlOrchestrator, PageFetcher};
use gongji::models::SourceId;

use super::{collect_records, emit, print_summary, OutputFormat};

/// Arguments of the `crawl` command
#[derive(Debug, Clone)]
pub struct CrawlParams {
    /// Boards to crawl; empty means all
    pub sources: Vec<SourceId>,
    /// Keep only titles containing this keyword
    pub query: Option<String>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    /// Page cap overriding the configured one
    pub pages: Option<u32>,
}

/// Crawl the requested boards once and print the merged results
pub async fn crawl(mut config: Config, params: CrawlParams, cancel: CancellationToken) -> Result<()> {
    if let Some(pages) = params.pages {
        config.crawler.max_pages = Some(pages);
    }

    let sources = if params.sources.is_empty() {
        SourceId::all()
    } else {
        params.sources.clone()
    };

    let fetcher = PageFetcher::with_config(config.request_timeout(), &config.crawler.user_agent)
        .map_err(gongji::error::Error::from)
        .context("Failed to create fetcher")?;
    let adapters = build_adapters(&config.board_definitions(), &sources, &fetcher)
        .map_err(gongji::error::Error::from)?;

    eprintln!("Crawling {} board(s)", adapters.len());
    for adapter in &adapters {
        let pages = adapter.pages();
        eprintln!(
            "  {} ({}): pages {}..={}",
            adapter.id().korean_name(),
            adapter.id(),
            pages.start(),
            pages.end()
        );
    }

    let orchestrator = CrawlOrchestrator::new(config.crawler.max_concurrent_sources, cancel);
    let results = orchestrator.run_all(&adapters).await;

    let records = collect_records(&results, params.query.as_deref());
    emit(&records, params.format, params.output.as_deref())?;
    print_summary(&results);

    if orchestrator.cancel_token().is_cancelled() {
        eprintln!("\nInterrupted; results above are partial.");
    }

    Ok(())
}
