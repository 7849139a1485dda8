//! Doualazoom crawler main entry point
//!
//! This is the command-line interface for the doualazoom.com company directory crawler.

use anyhow::Context;
use clap::Parser;
use doualazoom_crawler::config::{load_config_with_hash, validate, Config};
use doualazoom_crawler::crawler::crawl;
use doualazoom_crawler::output::print_statistics;
use doualazoom_crawler::state::{coerce_start_letter, LetterCursor};
use doualazoom_crawler::url::listing_url;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Doualazoom crawler: harvests the doualazoom.com company directory
///
/// Walks the A to Z company listings, visits every company detail page and
/// writes one JSON object per company to a JSON Lines file.
#[derive(Parser, Debug)]
#[command(name = "doualazoom-crawler")]
#[command(version)]
#[command(about = "Harvests the doualazoom.com company directory", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Letter to start from; anything other than a single A-Z letter means 'A'
    #[arg(long, value_name = "LETTER")]
    start_letter: Option<String>,

    /// Output JSON Lines file, overriding the configured path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    // Command-line overrides
    if let Some(letter) = cli.start_letter {
        config.crawler.start_letter = letter;
    }
    if let Some(output) = cli.output {
        config.output.path = output.display().to_string();
    }
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("doualazoom_crawler=info,warn"),
            1 => EnvFilter::new("doualazoom_crawler=debug,info"),
            2 => EnvFilter::new("doualazoom_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Doualazoom Crawler Dry Run ===\n");

    let start = coerce_start_letter(&config.crawler.start_letter);
    println!("Crawler Configuration:");
    println!(
        "  Start letter: {:?} (crawling from {})",
        config.crawler.start_letter, start
    );
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    match config.crawler.max_pages_per_letter {
        Some(cap) => println!("  Max pages per letter: {}", cap),
        None => println!("  Max pages per letter: unlimited"),
    }
    println!("  Request dedup: {}", config.crawler.dedupe_requests);

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Own domain: {}", config.site.own_domain);

    println!("\nFetching:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!(
        "  Retries: {} (base delay {}ms)",
        config.fetch.max_retries, config.fetch.retry_delay_ms
    );
    match &config.fetch.render_endpoint {
        Some(endpoint) => println!("  Render endpoint: {}", endpoint),
        None => println!("  Render endpoint: none (detail pages fetched directly)"),
    }

    println!("\nOutput:");
    println!("  Records: {}", config.output.path);

    let base_url = Url::parse(&config.site.base_url).context("Invalid base URL")?;
    let cursor = LetterCursor::new(start);
    println!("\nStart URLs ({}):", cursor.len());
    for letter in cursor {
        println!("  * {}", listing_url(&base_url, letter)?);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} with up to {} concurrent requests",
        config.site.base_url,
        config.crawler.max_concurrent_requests
    );

    // Records already written stay in the file when interrupted
    tokio::select! {
        result = crawl(config) => {
            let stats = result.context("Crawl failed")?;
            tracing::info!("Crawl completed successfully");
            print_statistics(&stats);
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, stopping crawl");
        }
    }

    Ok(())
}
