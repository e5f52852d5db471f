//! Scholar-Snapshot main entry point
//!
//! This is the command-line interface for the publication profile extractor.

use clap::Parser;
use scholar_snapshot::config::{load_config_with_hash, validate, Config, RenderBackend};
use scholar_snapshot::crawler::crawl;
use scholar_snapshot::enrich::{Categorizer, DEFAULT_TAXONOMY};
use scholar_snapshot::output::{print_statistics, write_snapshot, Snapshot};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Scholar-Snapshot: a publication profile extractor
///
/// Scholar-Snapshot reads a public publication profile page by page, keeps
/// the papers the profile owner is a leading or senior author on, tags them
/// by topic, fetches a thumbnail for each and writes a JSON snapshot.
#[derive(Parser, Debug)]
#[command(name = "scholar-snapshot")]
#[command(version = "1.0.0")]
#[command(about = "A publication profile extractor", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults if omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be extracted without any network access
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::info!("No configuration file given, using built-in defaults");
            let cfg = Config::default();
            validate(&cfg)?;
            cfg
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_extract(&config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scholar_snapshot=info,warn"),
            1 => EnvFilter::new("scholar_snapshot=debug,info"),
            2 => EnvFilter::new("scholar_snapshot=trace,debug"),
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

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Scholar-Snapshot Dry Run ===\n");

    println!("Profile:");
    println!("  Id: {}", config.profile.profile_id);
    println!("  Listing: {}", config.profile.base_url);
    println!("  Host: {}", config.profile.host);
    println!("  Language: {}", config.profile.language);
    println!("  Target author: {}", config.profile.target_author);
    println!(
        "  Image host filter: {}",
        config.profile.image_host_filter.as_deref().unwrap_or("(none)")
    );

    println!("\nCrawler Configuration:");
    println!("  Page size: {}", config.crawler.page_size);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Request delay: {}ms", config.crawler.request_delay);
    println!(
        "  Timeouts: page {}s, image {}s, pdf {}s",
        config.crawler.page_timeout, config.crawler.image_timeout, config.crawler.pdf_timeout
    );
    println!("  Enrich concurrency: {}", config.crawler.enrich_concurrency);

    println!("\nUser Agent:");
    println!("  Browser: {}", config.user_agent.browser);
    println!("  Accept-Language: {}", config.user_agent.accept_language);

    println!("\nOutput:");
    println!("  Snapshot: {}", config.output.snapshot_path);
    println!("  Images: {}", config.output.images_dir);
    println!("  PDFs: {}", config.output.pdf_tmp_dir);
    println!("  Default thumbnail: {}", config.output.default_thumbnail);
    println!("  Write when empty: {}", config.output.write_empty);

    println!("\nRendering:");
    match config.render.backend {
        RenderBackend::Pdftoppm => {
            println!("  Backend: pdftoppm ({}, {} dpi)", config.render.program, config.render.dpi)
        }
        RenderBackend::None => println!("  Backend: none"),
    }

    let categorizer = Categorizer::from_rules(&config.topics);
    let source = if config.topics.is_empty() {
        "built-in"
    } else {
        "configured"
    };
    println!("\nTopics ({}, {}):", categorizer.len(), source);
    if config.topics.is_empty() {
        for (tag, keywords) in DEFAULT_TAXONOMY {
            println!("  - {} ({} keywords)", tag, keywords.len());
        }
    } else {
        for topic in &config.topics {
            println!("  - {} ({} keywords)", topic.tag, topic.keywords.len());
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would read up to {} rows",
        config.crawler.page_size * config.crawler.max_pages
    );
}

/// Handles the main extraction and snapshot write
async fn handle_extract(config: &Config, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Extracting profile {} (target author: {})",
        config.profile.profile_id,
        config.profile.target_author
    );

    let report = match crawl(config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Extraction could not start: {}", e);
            return Err(e.into());
        }
    };

    if report.stop_reason.is_failure() {
        tracing::warn!("Run ended early: {}", report.stop_reason);
    } else if report.stop_reason.is_complete() {
        tracing::info!("Read the whole listing ({})", report.stop_reason.label());
    } else {
        tracing::info!("Listing not read to the end ({})", report.stop_reason);
    }

    let path = Path::new(&config.output.snapshot_path);
    if report.is_empty() && !config.output.write_empty {
        println!(
            "Zero records qualified; leaving {} untouched",
            path.display()
        );
    } else {
        let count = report.len();
        let snapshot = Snapshot::new(report.records);
        if let Err(e) = write_snapshot(&snapshot, path) {
            tracing::error!("Failed to write snapshot: {}", e);
            return Err(e.into());
        }
        println!("Successfully saved {} publications to {}", count, path.display());
    }

    if !quiet {
        println!();
        print_statistics(&report.stats, &report.stop_reason);
    }

    Ok(())
}
