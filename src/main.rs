//! pubmed-scraper - search PubMed and save the matching records as a table
//!
//! ## Usage
//!
//! ```bash
//! pubmed-scraper "machine learning[tiab] AND 2020:2024[dp]" --max 200 --email you@example.org
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use pubmed_scraper::{output, Pipeline, PipelineConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// PubMed Data Scraper
#[derive(Parser)]
#[command(name = "pubmed-scraper")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Search query (PubMed syntax, passed through unchanged)
    query: String,

    /// Maximum number of results to retrieve
    #[arg(long = "max", default_value_t = 100, allow_negative_numbers = true)]
    max_results: i64,

    /// Output file name
    #[arg(short, long, default_value = "pubmed_data.csv")]
    output: PathBuf,

    /// Output format
    #[arg(long, default_value = "csv", value_parser = ["csv", "json"])]
    format: String,

    /// Contact email sent to NCBI with every request
    #[arg(long, env = "NCBI_EMAIL")]
    email: String,

    /// NCBI API key (raises the rate limit to 10 requests/s)
    #[arg(long, env = "NCBI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Tool name sent to NCBI with every request
    #[arg(long, default_value = pubmed_scraper::config::DEFAULT_TOOL)]
    tool: String,

    /// Sort order for search results (relevance, pub_date, Author, JournalName)
    #[arg(long, default_value = "relevance")]
    sort: String,

    /// Identifiers per fetch request
    #[arg(long, default_value_t = pubmed_scraper::config::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Identifiers per search page
    #[arg(long, default_value_t = pubmed_scraper::config::DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Attempts per request before giving up
    #[arg(long, default_value_t = pubmed_scraper::config::DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Base backoff delay in milliseconds (doubles on every retry)
    #[arg(long, default_value_t = 2000)]
    base_delay_ms: u64,

    /// Maximum random jitter added to each backoff, in milliseconds
    #[arg(long, default_value_t = 0)]
    jitter_ms: u64,

    /// E-utilities base URL
    #[arg(long, default_value = pubmed_scraper::config::EUTILS_BASE_URL)]
    base_url: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            email: self.email.clone(),
            tool: self.tool.clone(),
            api_key: self.api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: self.base_url.clone(),
            sort: Some(self.sort.clone()),
            max_results: usize::try_from(self.max_results).unwrap_or(0),
            chunk_size: self.chunk_size,
            page_size: self.page_size,
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            jitter: Duration::from_millis(self.jitter_ms),
            ..PipelineConfig::default()
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.pipeline_config();

    println!("Searching PubMed for: {}", cli.query);
    println!("Maximum results: {}", config.max_results);

    let pipeline = Pipeline::from_config(&config)
        .context("Invalid configuration")?
        .with_progress(true);
    let report = pipeline
        .run(&cli.query, config.max_results)
        .await
        .context("PubMed retrieval failed")?;

    if report.found == 0 {
        println!("No results found for: {}", cli.query);
        return Ok(());
    }

    println!("Found {} publications", report.found);
    for failure in &report.failures {
        println!(
            "Warning: chunk {} ({} identifiers) skipped: {}",
            failure.index + 1,
            failure.ids.len(),
            failure.error
        );
    }
    if !report.failures.is_empty() || report.dropped > 0 {
        println!(
            "Warning: {} identifier(s) skipped, {} record(s) dropped",
            report.skipped_ids(),
            report.dropped
        );
    }
    println!("{}", report.summary());

    match cli.format.as_str() {
        "json" => output::write_json(&cli.output, &report.rows),
        _ => output::write_csv(&cli.output, &report.rows),
    }
    .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    println!("Data saved to {}", cli.output.display());
    println!("Done!");
    Ok(())
}
