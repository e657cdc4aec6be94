//! Cache and daily refresh working together

mod common;

use chrono::{Local, NaiveTime, TimeZone};
use common::{customs_page, local_board};
use gongji::cache::NoticeCache;
use gongji::crawler::{CrawlOrchestrator, PageFetcher, SourceAdapter};
use gongji::models::SourceId;
use gongji::scheduler::{
    duration_until, spawn_invalidator, RefreshTrigger, TriggerConfig, TriggerEvent,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Cached results are served until a refresh clears them
#[tokio::test]
async fn test_refresh_forces_recrawl() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(customs_page("1", "공고")))
        .expect(2)
        .mount(&server)
        .await;

    let adapter = SourceAdapter::new(
        local_board(SourceId::Customs, &server.uri(), 1, 1),
        PageFetcher::new().unwrap(),
    )
    .unwrap();
    let orchestrator = CrawlOrchestrator::default();
    let cache = Arc::new(NoticeCache::new());
    let trigger = RefreshTrigger::with_defaults().unwrap();
    let (_handle, mut generations) = spawn_invalidator(cache.clone(), trigger.subscribe());

    for _ in 0..3 {
        let crawl = cache
            .get_or_crawl(SourceId::Customs, || orchestrator.run_one(&adapter))
            .await;
        assert_eq!(crawl.records.len(), 1);
    }
    assert_eq!(cache.stats().hits, 2);

    trigger.force_refresh();
    generations.changed().await.unwrap();
    assert!(cache.is_empty().await);

    let crawl = cache
        .get_or_crawl(SourceId::Customs, || orchestrator.run_one(&adapter))
        .await;
    assert_eq!(crawl.records.len(), 1);
    assert_eq!(cache.stats().stores, 2);
}

/// Startup refresh is delivered to subscribers before the daily wait
#[tokio::test]
async fn test_trigger_on_startup_then_cancel() {
    let config = TriggerConfig::builder()
        .refresh_time("03:00")
        .trigger_on_startup(true)
        .build()
        .unwrap();
    let trigger = Arc::new(RefreshTrigger::new(config).unwrap());
    let mut events = trigger.subscribe();
    let cancel = CancellationToken::new();

    let task = {
        let trigger = trigger.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { trigger.start(&cancel).await })
    };

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("startup event should arrive")
        .unwrap();
    assert!(matches!(event, TriggerEvent::Refresh { .. }));

    cancel.cancel();
    assert!(task.await.unwrap().is_ok());
    assert_eq!(trigger.refresh_count(), 1);
}

#[test]
fn test_next_refresh_is_within_a_day() {
    let at = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
    let now = Local.with_ymd_and_hms(2025, 3, 27, 9, 30, 0).unwrap();
    let wait = duration_until(now, at).unwrap();
    assert_eq!(wait.num_minutes(), 8 * 60 + 30);

    let now = Local.with_ymd_and_hms(2025, 3, 27, 18, 0, 0).unwrap();
    let wait = duration_until(now, at).unwrap();
    assert!(wait.num_hours() >= 23 && wait.num_hours() <= 25);
}

#[test]
fn test_invalid_refresh_time_rejected() {
    let result = TriggerConfig::builder().refresh_time("24:30").build();
    assert!(result.is_err());
}
