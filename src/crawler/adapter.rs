//! Crawl unit for one board
//!
//! A [`SourceAdapter`] binds a validated [`SourceConfig`] to a shared
//! [`PageFetcher`] and walks the configured page range: build the request,
//! fetch with the board's retry policy, extract rows, resolve links. Pages
//! that fail after retries are counted and skipped; nothing short of a
//! broken configuration stops the walk.

use reqwest::header::HeaderMap;
use std::ops::RangeInclusive;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::crawler::headers::build_board_headers;
use crate::crawler::link::LinkResolver;
use crate::crawler::source::SourceConfig;
use crate::models::{CrawlSummary, NoticeRecord, PageRequest, SourceCrawl, SourceId};
use crate::parser::RecordExtractor;
use crate::utils::error::{CrawlerError, ParseError};

/// Crawlable unit for one board
#[derive(Debug)]
pub struct SourceAdapter {
    config: SourceConfig,
    fetcher: PageFetcher,
    headers: HeaderMap,
    extractor: RecordExtractor,
    resolver: LinkResolver,
}

/// What a single page contributed
enum PageResult {
    Harvested(Vec<NoticeRecord>),
    Empty,
    Skipped,
}

impl SourceAdapter {
    /// Validate `config` and compile its rules
    ///
    /// # Errors
    ///
    /// Returns `CrawlerError::InvalidConfig` when the endpoint, page range,
    /// selectors, link strategy or headers are unusable.
    pub fn new(config: SourceConfig, fetcher: PageFetcher) -> Result<Self, CrawlerError> {
        config.validate()?;

        let headers = build_board_headers(&config.headers, fetcher.user_agent())
            .map_err(|e| CrawlerError::invalid_config(config.id, e))?;
        let extractor = RecordExtractor::new(&config.rule).map_err(|e| (config.id, e))?;
        let resolver =
            LinkResolver::new(&config.link, config.endpoint.trim()).map_err(|e| (config.id, e))?;

        Ok(Self {
            config,
            fetcher,
            headers,
            extractor,
            resolver,
        })
    }

    pub fn id(&self) -> SourceId {
        self.config.id
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Pages this adapter will visit
    pub fn pages(&self) -> RangeInclusive<u32> {
        self.config.pages()
    }

    /// Request for `page`: fixed fields first, then the page field
    pub fn build_request(&self, page: u32) -> PageRequest {
        let mut params = self.config.payload.clone();
        params.push((self.config.page_field.clone(), page.to_string()));

        PageRequest {
            source: self.config.id,
            page,
            method: self.config.method,
            url: self.config.endpoint.trim().to_string(),
            params,
        }
    }

    /// Crawl the whole page range
    ///
    /// Records come back page-ascending, row order preserved within a page.
    /// When `cancel` fires the crawl stops before the next page (or during
    /// a delay or retry wait) and returns what it has.
    #[instrument(skip_all, fields(source = %self.config.id))]
    pub async fn crawl(&self, cancel: &CancellationToken) -> SourceCrawl {
        let mut records = Vec::new();
        let mut summary = CrawlSummary::default();
        let last_page = self.config.last_page;

        info!(
            pages = self.config.page_count(),
            method = %self.config.method,
            "Starting crawl"
        );

        for page in self.pages() {
            if cancel.is_cancelled() {
                break;
            }

            summary.pages_attempted += 1;
            match self.crawl_page(page, cancel).await {
                PageResult::Harvested(mut page_records) => {
                    summary.pages_succeeded += 1;
                    summary.records_harvested += page_records.len() as u64;
                    debug!(page, records = page_records.len(), "Page harvested");
                    records.append(&mut page_records);
                }
                PageResult::Empty => {
                    summary.pages_succeeded += 1;
                    summary.pages_empty += 1;
                }
                PageResult::Skipped => {
                    summary.pages_skipped += 1;
                }
            }

            let delay = self.config.page_delay();
            if page < last_page && !delay.is_zero() {
                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    () = cancel.cancelled() => {}
                }
            }
        }

        if cancel.is_cancelled() {
            summary.cancelled = true;
        }

        SourceCrawl { records, summary }
    }

    async fn crawl_page(&self, page: u32, cancel: &CancellationToken) -> PageResult {
        let request = self.build_request(page);
        let outcome = self
            .fetcher
            .fetch(&request, &self.headers, &self.config.retry, cancel)
            .await;

        let body = match outcome {
            FetchOutcome::Success { body, .. } => body,
            FetchOutcome::HttpError { status } => {
                warn!(page, status, "Skipping page after HTTP errors");
                return PageResult::Skipped;
            }
            FetchOutcome::TransientFailure { cause } => {
                warn!(page, error = %cause, "Skipping page after transport errors");
                return PageResult::Skipped;
            }
        };

        match self.extractor.extract(&body) {
            Ok(rows) => PageResult::Harvested(
                rows.into_iter()
                    .filter_map(|row| {
                        let url = self.resolver.resolve(&row.link_tokens);
                        NoticeRecord::new(self.config.id, row.title, row.date, url)
                            .map(|record| record.with_department(row.department))
                    })
                    .collect(),
            ),
            Err(ParseError::StructuralGap { step }) => {
                info!(page, missing = %step, "No listing container on page");
                PageResult::Empty
            }
            Err(err) => {
                // Selectors were compiled in new()
                warn!(page, error = %err, "Extraction failed");
                PageResult::Empty
            }
        }
    }
}
