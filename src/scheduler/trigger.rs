//! Daily refresh trigger
//!
//! This module wakes up once a day at a configured local time (18:00 by
//! default) and broadcasts a refresh event. It never touches cached data
//! itself; [`spawn_invalidator`] is the listener that turns events into
//! cache invalidation.

use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{SchedulerError, SchedulerResult};
use crate::cache::NoticeCache;

// ============================================================================
// Trigger Configuration
// ============================================================================

/// Configuration for the refresh trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Local time of the daily refresh (24h "HH:MM", e.g. "18:00")
    pub refresh_time: String,

    /// Emit one refresh as soon as the trigger starts
    pub trigger_on_startup: bool,

    /// Capacity of the event channel
    pub channel_capacity: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            refresh_time: "18:00".to_string(),
            trigger_on_startup: false,
            channel_capacity: 16,
        }
    }
}

impl TriggerConfig {
    /// Create a new config builder
    pub fn builder() -> TriggerConfigBuilder {
        TriggerConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> SchedulerResult<()> {
        self.parse_refresh_time()?;

        if self.channel_capacity == 0 {
            return Err(SchedulerError::trigger_config(
                "channel_capacity",
                "Channel capacity must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Parse the refresh time
    pub fn parse_refresh_time(&self) -> SchedulerResult<NaiveTime> {
        NaiveTime::parse_from_str(self.refresh_time.trim(), "%H:%M")
            .map_err(|_| SchedulerError::invalid_time(&self.refresh_time))
    }
}

/// Builder for TriggerConfig
#[derive(Debug, Default)]
pub struct TriggerConfigBuilder {
    refresh_time: Option<String>,
    trigger_on_startup: Option<bool>,
    channel_capacity: Option<usize>,
}

impl TriggerConfigBuilder {
    /// Set refresh time
    pub fn refresh_time(mut self, time: impl Into<String>) -> Self {
        self.refresh_time = Some(time.into());
        self
    }

    /// Set trigger on startup
    pub fn trigger_on_startup(mut self, value: bool) -> Self {
        self.trigger_on_startup = Some(value);
        self
    }

    /// Set event channel capacity
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = Some(capacity);
        self
    }

    /// Build the config
    pub fn build(self) -> SchedulerResult<TriggerConfig> {
        let defaults = TriggerConfig::default();
        let config = TriggerConfig {
            refresh_time: self.refresh_time.unwrap_or(defaults.refresh_time),
            trigger_on_startup: self
                .trigger_on_startup
                .unwrap_or(defaults.trigger_on_startup),
            channel_capacity: self.channel_capacity.unwrap_or(defaults.channel_capacity),
        };
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Trigger Events
// ============================================================================

/// Why a refresh was emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshReason {
    /// Daily refresh time reached
    Scheduled,
    /// Trigger started with `trigger_on_startup`
    Startup,
    /// [`RefreshTrigger::force_refresh`] was called
    Manual,
}

/// Events emitted by the trigger
#[derive(Debug, Clone)]
pub enum TriggerEvent {
    /// Cached results should be dropped
    Refresh {
        reason: RefreshReason,
        triggered_at: DateTime<Utc>,
    },
}

// ============================================================================
// Time math
// ============================================================================

/// Time from `now` until the next occurrence of `at` (local wall clock)
///
/// If `now` is exactly at or past today's `at`, the next occurrence is
/// tomorrow. Wall-clock gaps (DST) resolve to the earliest valid instant.
pub fn duration_until(now: DateTime<Local>, at: NaiveTime) -> SchedulerResult<Duration> {
    let today = now.date_naive();
    let target = resolve_local(today.and_time(at))?;

    if now < target {
        return Ok(target.signed_duration_since(now));
    }

    let tomorrow = today + Duration::days(1);
    let target = resolve_local(tomorrow.and_time(at))?;
    Ok(target.signed_duration_since(now))
}

fn resolve_local(naive: NaiveDateTime) -> SchedulerResult<DateTime<Local>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
        })
        .ok_or_else(|| SchedulerError::execution_failed(format!("No local time for {naive}")))
}

// ============================================================================
// Refresh Trigger
// ============================================================================

/// Daily refresh trigger
pub struct RefreshTrigger {
    config: TriggerConfig,
    refresh_at: NaiveTime,
    event_sender: broadcast::Sender<TriggerEvent>,
    refresh_count: AtomicU64,
}

impl RefreshTrigger {
    /// Create a new refresh trigger
    pub fn new(config: TriggerConfig) -> SchedulerResult<Self> {
        config.validate()?;
        let refresh_at = config.parse_refresh_time()?;
        let (event_sender, _) = broadcast::channel(config.channel_capacity);

        Ok(Self {
            config,
            refresh_at,
            event_sender,
            refresh_count: AtomicU64::new(0),
        })
    }

    /// Create with default config
    pub fn with_defaults() -> SchedulerResult<Self> {
        Self::new(TriggerConfig::default())
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Subscribe to trigger events
    pub fn subscribe(&self) -> broadcast::Receiver<TriggerEvent> {
        self.event_sender.subscribe()
    }

    /// Calculate duration until the next refresh
    pub fn duration_until_refresh(&self) -> SchedulerResult<Duration> {
        duration_until(Local::now(), self.refresh_at)
    }

    /// Number of refresh events emitted so far
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::Relaxed)
    }

    /// Emit a refresh now; returns how many subscribers received it
    pub fn force_refresh(&self) -> usize {
        self.emit(RefreshReason::Manual)
    }

    /// Run the trigger loop until `cancel` fires
    pub async fn start(&self, cancel: &CancellationToken) -> SchedulerResult<()> {
        info!(refresh_time = %self.config.refresh_time, "Refresh trigger started");

        if self.config.trigger_on_startup {
            self.emit(RefreshReason::Startup);
        }

        loop {
            let wait = self.duration_until_refresh()?;
            let wait = wait
                .to_std()
                .unwrap_or(std::time::Duration::from_secs(60));
            debug!(wait_secs = wait.as_secs(), "Waiting for next refresh");

            tokio::select! {
                () = tokio::time::sleep(wait) => {
                    self.emit(RefreshReason::Scheduled);
                }
                () = cancel.cancelled() => {
                    info!("Refresh trigger stopped");
                    break;
                }
            }
        }

        Ok(())
    }

    fn emit(&self, reason: RefreshReason) -> usize {
        self.refresh_count.fetch_add(1, Ordering::Relaxed);
        let event = TriggerEvent::Refresh {
            reason,
            triggered_at: Utc::now(),
        };

        match self.event_sender.send(event) {
            Ok(receivers) => {
                info!(?reason, receivers, "Refresh emitted");
                receivers
            }
            Err(_) => {
                warn!(?reason, "Refresh emitted with no subscribers");
                0
            }
        }
    }
}

/// Clear `cache` on every refresh event until the channel closes
///
/// The returned `watch` receiver carries the number of invalidations done
/// so far; it changes only after the cache has actually been cleared.
pub fn spawn_invalidator(
    cache: Arc<NoticeCache>,
    mut receiver: broadcast::Receiver<TriggerEvent>,
) -> (JoinHandle<()>, watch::Receiver<u64>) {
    let (generation_tx, generation_rx) = watch::channel(0u64);

    let handle = tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(TriggerEvent::Refresh { reason, .. }) => {
                    let removed = cache.clear_all().await;
                    info!(?reason, removed, "Cache invalidated");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    let removed = cache.clear_all().await;
                    warn!(skipped, removed, "Invalidator lagged, cache cleared");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
            generation_tx.send_modify(|generation| *generation += 1);
        }
    });

    (handle, generation_rx)
}

// ============================================================================
// Tests
// ============================================================================
