//! Configuration management for the gongji crawler
//!
//! This module handles loading and validating configuration from a TOML file
//! and `GONGJI_*` environment variables. Environment values win over the file.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::crawler::SourceConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Crawler configuration
    pub crawler: CrawlerConfig,

    /// Daily refresh configuration
    pub schedule: ScheduleConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Board definitions replacing the built-in ones with the same id
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceConfig>,
}

/// Crawler-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of boards crawled at once
    pub max_concurrent_sources: usize,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// User agent for boards that don't set their own
    pub user_agent: String,

    /// Cap on pages crawled per board (unset = full range)
    pub max_pages: Option<u32>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sources: 5,
            request_timeout_secs: 10,
            user_agent: format!("gongji/{}", env!("CARGO_PKG_VERSION")),
            max_pages: None,
        }
    }
}

/// Daily refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Local time of the daily cache refresh, "HH:MM"
    pub refresh_time: String,

    /// Whether `watch` refreshes at all
    pub enabled: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            refresh_time: String::from("18:00"),
            enabled: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl Config {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// File (when given) or defaults, then environment overrides, then validation
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Override fields from `GONGJI_*` environment variables
    pub fn apply_env(&mut self) {
        if let Some(v) = env_parse("GONGJI_MAX_CONCURRENT_SOURCES") {
            self.crawler.max_concurrent_sources = v;
        }
        if let Some(v) = env_parse("GONGJI_REQUEST_TIMEOUT") {
            self.crawler.request_timeout_secs = v;
        }
        if let Ok(v) = std::env::var("GONGJI_USER_AGENT") {
            self.crawler.user_agent = v;
        }
        if let Some(v) = env_parse("GONGJI_MAX_PAGES") {
            self.crawler.max_pages = Some(v);
        }
        if let Ok(v) = std::env::var("GONGJI_REFRESH_TIME") {
            self.schedule.refresh_time = v;
        }
        if let Ok(v) = std::env::var("GONGJI_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("GONGJI_LOG_FORMAT") {
            self.logging.format = v;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.crawler.max_concurrent_sources == 0 {
            anyhow::bail!("max_concurrent_sources must be greater than 0");
        }

        if self.crawler.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.crawler.max_pages == Some(0) {
            anyhow::bail!("max_pages must be greater than 0 when set");
        }

        NaiveTime::parse_from_str(self.schedule.refresh_time.trim(), "%H:%M").with_context(
            || format!("refresh_time must be HH:MM, got '{}'", self.schedule.refresh_time),
        )?;

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!(
                "logging.format must be 'text' or 'json', got '{}'",
                self.logging.format
            );
        }

        for source in &self.sources {
            source
                .validate()
                .with_context(|| format!("Invalid board definition for {}", source.id))?;
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.request_timeout_secs)
    }

    /// Built-in boards with configured replacements applied and page cap enforced
    #[must_use]
    pub fn board_definitions(&self) -> Vec<SourceConfig> {
        SourceConfig::builtins()
            .into_iter()
            .map(|builtin| {
                self.sources
                    .iter()
                    .rev()
                    .find(|s| s.id == builtin.id)
                    .cloned()
                    .unwrap_or(builtin)
            })
            .map(|config| match self.crawler.max_pages {
                Some(max) => config.limit_pages(max),
                None => config,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceId;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_concurrent_sources() {
        let mut config = Config::default();
        config.crawler.max_concurrent_sources = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_timeout() {
        let mut config = Config::default();
        config.crawler.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_refresh_time() {
        let mut config = Config::default();
        config.schedule.refresh_time = "25:00".to_string();
        assert!(config.validate().is_err());
        config.schedule.refresh_time = "six".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_timeout_conversion() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_board_definitions_apply_overrides_and_cap() {
        let mut custom = SourceConfig::builtin(SourceId::Nts);
        custom.last_page = 3;

        let mut config = Config::default();
        config.sources.push(custom);
        config.crawler.max_pages = Some(2);

        let boards = config.board_definitions();
        assert_eq!(boards.len(), 5);
        let nts = boards.iter().find(|b| b.id == SourceId::Nts).unwrap();
        assert_eq!(nts.last_page, 2);
        let pps = boards.iter().find(|b| b.id == SourceId::Pps).unwrap();
        assert_eq!(pps.last_page, 2);
    }

    #[test]
    fn test_invalid_board_override_rejected() {
        let mut bad = SourceConfig::builtin(SourceId::Customs);
        bad.first_page = 9;
        bad.last_page = 1;

        let mut config = Config::default();
        config.sources.push(bad);
        assert!(config.validate().is_err());
    }
}
