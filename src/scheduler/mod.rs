//! Daily refresh scheduling
//!
//! Board listings change during the working day, so cached crawls are
//! dropped once a day. The trigger only broadcasts events; whoever owns the
//! cache subscribes and invalidates it.
//!
//! ```text
//!  RefreshTrigger ──(TriggerEvent::Refresh)──► spawn_invalidator ──► NoticeCache::clear_all
//!        │
//!        └──(other subscribers, e.g. `watch` re-crawling)
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use gongji::cache::NoticeCache;
//! use gongji::scheduler::{spawn_invalidator, RefreshTrigger, TriggerConfig};
//!
//! let cache = Arc::new(NoticeCache::new());
//! let trigger = RefreshTrigger::new(TriggerConfig::builder().refresh_time("18:00").build()?)?;
//! let _invalidator = spawn_invalidator(cache.clone(), trigger.subscribe());
//! trigger.start(&cancel).await?;
//! ```

pub mod error;
pub mod trigger;

// Re-export main types
pub use error::{SchedulerError, SchedulerResult};
pub use trigger::{
    duration_until, spawn_invalidator, RefreshReason, RefreshTrigger, TriggerConfig,
    TriggerConfigBuilder, TriggerEvent,
};
