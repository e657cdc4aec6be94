pub mod crawl;
pub mod sources;
pub mod watch;

// Re-export command functions for convenience
pub use crawl::{crawl, CrawlParams};
pub use sources::sources;
pub use watch::{watch, WatchParams};

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::collections::BTreeMap;
use std::path::Path;

use gongji::models::{NoticeRecord, SourceCrawl, SourceId};
use gongji::utils::truncate_text;

/// Title column width in the text table, in characters
const TITLE_WIDTH: usize = 60;

/// How results are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table of title and date
    Text,
    /// JSON array of records, including detail URLs
    Json,
}

/// Records of every crawl in source order, optionally filtered by title keyword
pub fn collect_records<'a>(
    results: &'a BTreeMap<SourceId, SourceCrawl>,
    query: Option<&str>,
) -> Vec<&'a NoticeRecord> {
    results
        .values()
        .flat_map(|crawl| crawl.records.iter())
        .filter(|record| query.map_or(true, |q| record.title_contains(q)))
        .collect()
}

/// Title/date table, one line per record
pub fn render_table(records: &[&NoticeRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<8} {:<12} {}\n", "SOURCE", "DATE", "TITLE"));
    out.push_str(&format!("{}\n", "-".repeat(8 + 1 + 12 + 1 + TITLE_WIDTH)));

    for record in records {
        let date = if record.published_date().is_empty() {
            "-"
        } else {
            record.published_date()
        };
        out.push_str(&format!(
            "{:<8} {:<12} {}\n",
            record.source().as_str(),
            date,
            truncate_text(record.title(), TITLE_WIDTH)
        ));
    }

    out
}

pub fn render_json(records: &[&NoticeRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("Failed to serialize records")
}

/// Render in `format` and write to `output`, or stdout when unset
pub fn emit(records: &[&NoticeRecord], format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => render_table(records),
        OutputFormat::Json => render_json(records)?,
    };

    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            tracing::info!(path = %path.display(), records = records.len(), "Results written");
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

/// Per-source counters, printed to stderr so stdout stays parseable
pub fn print_summary(results: &BTreeMap<SourceId, SourceCrawl>) {
    eprintln!("\nCrawl Summary");
    eprintln!("=============");
    for (source, crawl) in results {
        let summary = &crawl.summary;
        let mut line = format!(
            "{} ({}): {} notices, pages {}/{} ok, {} skipped, {} empty",
            source.korean_name(),
            source,
            summary.records_harvested,
            summary.pages_succeeded,
            summary.pages_attempted,
            summary.pages_skipped,
            summary.pages_empty,
        );
        if summary.cancelled {
            line.push_str(" (cancelled)");
        }
        eprintln!("{line}");
    }
}
