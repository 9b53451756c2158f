//! CLI for fetchguard.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fetchguard_core::config;
use fetchguard_core::gate::ResolutionFailurePolicy;
use fetchguard_core::http::Method;
use std::path::PathBuf;

use commands::{run_aggregate, run_api, run_check, run_fetch, run_scrape, run_stats, run_summary};

/// Exit code of `check` when at least one URL is denied.
pub const EXIT_DENIED: i32 = 2;

/// Top-level CLI for fetchguard.
#[derive(Debug, Parser)]
#[command(name = "fetchguard")]
#[command(
    about = "fetchguard: SSRF-safe fetching, a retrying JSON client and table tools",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Check URLs against the safety gate without fetching them.
    Check {
        /// URLs to check.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Pin HOST to IP instead of asking DNS (repeatable), e.g. `api.test=10.0.0.1`.
        #[arg(long = "resolve", value_name = "HOST=IP")]
        resolve: Vec<String>,

        /// Override the configured policy for hosts that do not resolve.
        #[arg(long, value_name = "allow|deny")]
        on_resolution_failure: Option<ResolutionFailurePolicy>,

        /// Print one JSON object per URL.
        #[arg(long)]
        json: bool,
    },

    /// Fetch a URL through the gate, re-checking every redirect hop.
    Fetch {
        /// HTTP/HTTPS URL.
        url: String,

        /// Write the body to FILE instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Fetch BASE_URL?page=1..N through the gate and list the articles found.
    Scrape {
        /// Listing URL; `page=N` is appended to its query.
        base_url: String,

        /// Number of pages.
        #[arg(long, default_value = "5", value_name = "N")]
        pages: u32,

        /// Seconds to wait between pages.
        #[arg(long, default_value = "1.0", value_name = "SECS")]
        delay: f64,

        /// Print one JSON object per article.
        #[arg(long)]
        json: bool,
    },

    /// Call a JSON API with retries and rate limiting.
    Api {
        /// GET, POST, PUT, PATCH or DELETE.
        method: Method,

        /// API root, e.g. `https://api.example.com/v1`.
        base_url: String,

        /// Endpoint path below the root.
        endpoint: String,

        /// JSON request body.
        #[arg(long, value_name = "JSON")]
        data: Option<String>,

        /// Bearer token.
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
    },

    /// Show shape, column types and missing values of a CSV/JSON file.
    Summary {
        /// Path to a .csv or .json file.
        file: PathBuf,
    },

    /// Group rows and reduce columns (sum, mean, count, min, max).
    Aggregate {
        /// Path to a .csv or .json file.
        file: PathBuf,

        /// Comma-separated grouping columns.
        #[arg(long, value_delimiter = ',', required = true, value_name = "COLS")]
        group_by: Vec<String>,

        /// Reduction as COLUMN=FUNCTION (repeatable).
        #[arg(long = "agg", required = true, value_name = "COL=FN")]
        aggs: Vec<String>,

        /// Save the result (format from extension) instead of printing CSV.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Descriptive statistics for numeric columns.
    Stats {
        /// Path to a .csv or .json file.
        file: PathBuf,

        /// Comma-separated columns (default: all numeric columns).
        #[arg(long, value_delimiter = ',', value_name = "COLS")]
        columns: Vec<String>,
    },
}

impl CliCommand {
    /// Parses arguments and runs the command; returns the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Check {
                urls,
                resolve,
                on_resolution_failure,
                json,
            } => {
                let all_allowed =
                    run_check(&cfg, &urls, &resolve, on_resolution_failure, json).await?;
                if !all_allowed {
                    return Ok(EXIT_DENIED);
                }
            }
            CliCommand::Fetch { url, output } => run_fetch(&cfg, &url, output.as_deref()).await?,
            CliCommand::Scrape {
                base_url,
                pages,
                delay,
                json,
            } => run_scrape(&cfg, &base_url, pages, delay, json).await?,
            CliCommand::Api {
                method,
                base_url,
                endpoint,
                data,
                api_key,
            } => run_api(&cfg, method, &base_url, &endpoint, data.as_deref(), api_key).await?,
            CliCommand::Summary { file } => run_summary(&file).await?,
            CliCommand::Aggregate {
                file,
                group_by,
                aggs,
                output,
            } => run_aggregate(&file, &group_by, &aggs, output.as_deref()).await?,
            CliCommand::Stats { file, columns } => run_stats(&file, &columns).await?,
        }

        Ok(0)
    }
}

#[cfg(test)]
mod tests;
