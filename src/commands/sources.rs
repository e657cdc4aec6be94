use anyhow::{Context, Result};
use serde::Serialize;

use gongji::config::Config;
use gongji::crawler::SourceConfig;
use gongji::utils::retry::Attempts;

use super::OutputFormat;

#[derive(Debug, Serialize)]
struct BoardInfo<'a> {
    id: String,
    name: &'static str,
    method: String,
    endpoint: &'a str,
    page_field: &'a str,
    first_page: u32,
    last_page: u32,
    link: &'static str,
    retry: String,
}

impl<'a> From<&'a SourceConfig> for BoardInfo<'a> {
    fn from(config: &'a SourceConfig) -> Self {
        Self {
            id: config.id.to_string(),
            name: config.id.korean_name(),
            method: config.method.to_string(),
            endpoint: &config.endpoint,
            page_field: &config.page_field,
            first_page: config.first_page,
            last_page: config.last_page,
            link: config.link.kind(),
            retry: describe_retry(config),
        }
    }
}

fn describe_retry(config: &SourceConfig) -> String {
    match config.retry.attempts {
        Attempts::Bounded(n) => format!("{n} x {}ms", config.retry.delay_ms),
        Attempts::Unbounded => format!("until ok, {}ms", config.retry.delay_ms),
    }
}

/// List the board definitions in effect
pub fn sources(config: &Config, format: OutputFormat) -> Result<()> {
    let boards = config.board_definitions();
    let infos: Vec<BoardInfo<'_>> = boards.iter().map(BoardInfo::from).collect();

    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&infos).context("Failed to serialize boards")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            println!("Notice Boards");
            println!("=============");
            for info in &infos {
                println!("\n{} ({})", info.name, info.id);
                println!("  {} {}", info.method, info.endpoint);
                println!(
                    "  pages: {}={}..={}",
                    info.page_field, info.first_page, info.last_page
                );
                println!("  link: {}", info.link);
                println!("  retry: {}", info.retry);
            }
        }
    }

    Ok(())
}
