use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch::Receiver;
use tokio_util::sync::CancellationToken;

use gongji::cache::NoticeCache;
use gongji::config::Config;
use gongji::crawler::{build_adapters, CrawlOrchestrator, PageFetcher, SourceAdapter};
use gongji::models::{SourceCrawl, SourceId};
use gongji::scheduler::{spawn_invalidator, RefreshTrigger, TriggerConfig};

use super::{collect_records, emit, print_summary, OutputFormat};

/// Arguments of the `watch` command
#[derive(Debug, Clone)]
pub struct WatchParams {
    pub sources: Vec<SourceId>,
    pub query: Option<String>,
}

/// Crawl once, then re-crawl after every daily refresh until interrupted
///
/// Results come from the notice cache; the refresh trigger empties it so the
/// next round fetches fresh listings.
pub async fn watch(config: Config, params: WatchParams, cancel: CancellationToken) -> Result<()> {
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
    let orchestrator =
        CrawlOrchestrator::new(config.crawler.max_concurrent_sources, cancel.clone());

    let cache = Arc::new(NoticeCache::new());
    let trigger_config = TriggerConfig::builder()
        .refresh_time(config.schedule.refresh_time.clone())
        .build()
        .map_err(gongji::error::Error::from)?;
    let trigger = Arc::new(RefreshTrigger::new(trigger_config).map_err(gongji::error::Error::from)?);
    let (invalidator, mut generations) = spawn_invalidator(cache.clone(), trigger.subscribe());

    let trigger_task = if config.schedule.enabled {
        let trigger = trigger.clone();
        let cancel = cancel.clone();
        Some(tokio::spawn(async move { trigger.start(&cancel).await }))
    } else {
        tracing::info!("Daily refresh disabled; crawling once");
        None
    };

    loop {
        let results = crawl_cached(
            &cache,
            &orchestrator,
            &adapters,
            config.crawler.max_concurrent_sources,
        )
        .await;
        let records = collect_records(&results, params.query.as_deref());

        println!(
            "\n[{}] {} notice(s)",
            chrono::Local::now().format("%Y-%m-%d %H:%M"),
            records.len()
        );
        emit(&records, OutputFormat::Text, None)?;
        print_summary(&results);

        let stats = cache.stats();
        tracing::debug!(
            hits = stats.hits,
            misses = stats.misses,
            hit_rate = stats.hit_rate(),
            "Notice cache stats"
        );

        if config.schedule.enabled {
            if let Ok(wait) = trigger.duration_until_refresh() {
                eprintln!(
                    "Next refresh at {} (in {} min)",
                    config.schedule.refresh_time,
                    wait.num_minutes()
                );
            }
        }

        if !wait_for_refresh(config.schedule.enabled, &cancel, &mut generations).await {
            break;
        }
        tracing::info!(refreshes = trigger.refresh_count(), "Refreshing notices");
    }

    if let Some(task) = trigger_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Refresh trigger stopped with error"),
            Err(e) => tracing::warn!(error = %e, "Refresh trigger task failed"),
        }
    }
    drop(trigger);
    invalidator.abort();

    eprintln!("Stopped watching.");
    Ok(())
}

/// Wait until the cache has been invalidated
///
/// Returns `false` when no further round should run: the daily refresh is
/// disabled, `cancel` fired, or the invalidator is gone.
async fn wait_for_refresh(
    schedule_enabled: bool,
    cancel: &CancellationToken,
    generations: &mut Receiver<u64>,
) -> bool {
    if !schedule_enabled {
        return false;
    }

    tokio::select! {
        _ = cancel.cancelled() => false,
        changed = generations.changed() => changed.is_ok(),
    }
}

async fn crawl_cached(
    cache: &NoticeCache,
    orchestrator: &CrawlOrchestrator,
    adapters: &[SourceAdapter],
    max_concurrent: usize,
) -> BTreeMap<SourceId, SourceCrawl> {
    stream::iter(adapters)
        .map(|adapter| async move {
            let crawl = cache
                .get_or_crawl(adapter.id(), || orchestrator.run_one(adapter))
                .await;
            (adapter.id(), crawl)
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await
}
