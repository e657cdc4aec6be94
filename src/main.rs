use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gongji::config::Config;
use gongji::error::{Error, GongjiErrorTrait};
use gongji::models::SourceId;

mod commands;

use commands::{CrawlParams, OutputFormat, WatchParams};

#[derive(Parser)]
#[command(
    name = "gongji",
    version,
    about = "Korean government notice board aggregator",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "GONGJI_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured one
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl notice boards once
    Crawl {
        /// Board to crawl (customs, nts, moef, kostat, pps); repeat for several, omit for all
        #[arg(short, long = "source", value_parser = parse_source)]
        sources: Vec<SourceId>,

        /// Keep only notices whose title contains this keyword
        #[arg(short, long)]
        query: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write results to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Crawl at most this many pages per board
        #[arg(short, long)]
        pages: Option<u32>,
    },

    /// List the configured notice boards
    Sources {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Crawl, then re-crawl after every daily refresh
    Watch {
        /// Board to watch; repeat for several, omit for all
        #[arg(short, long = "source", value_parser = parse_source)]
        sources: Vec<SourceId>,

        /// Keep only notices whose title contains this keyword
        #[arg(short, long)]
        query: Option<String>,
    },
}

fn parse_source(value: &str) -> Result<SourceId, String> {
    SourceId::parse(value).ok_or_else(|| {
        format!("unknown board '{value}' (expected one of customs, nts, moef, kostat, pps)")
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing/logging
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("gongji notice aggregator starting");

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let result = match cli.command {
        Commands::Crawl {
            sources,
            query,
            format,
            output,
            pages,
        } => {
            let params = CrawlParams {
                sources,
                query,
                format,
                output,
                pages,
            };
            commands::crawl(config, params, cancel).await
        }
        Commands::Sources { format } => commands::sources(&config, format),
        Commands::Watch { sources, query } => {
            commands::watch(config, WatchParams { sources, query }, cancel).await
        }
    };

    if let Err(e) = &result {
        if let Some(err) = e.downcast_ref::<Error>() {
            tracing::error!(
                category = ?err.category(),
                recoverable = err.is_recoverable(),
                "{}: {}",
                err.category().korean_desc(),
                err.korean_desc()
            );
        }
    }

    result
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Interrupt received, stopping crawl");
                cancel.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for interrupt"),
        }
    });
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("gongji=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(format!("gongji={level},warn")))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
