//! Storefront Harvester main entry point
//!
//! This is the command-line interface for submitting and inspecting scrape jobs.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use storefront_harvester::config::{load_config_with_hash, Config};
use storefront_harvester::engine::build_engines;
use storefront_harvester::jobs::SharedStore;
use storefront_harvester::storage::open_store;
use storefront_harvester::{default_registry, JobRunner, JobStatus, ParserRegistry};
use tracing_subscriber::EnvFilter;

/// Storefront Harvester: on-demand product scraping
///
/// Runs scrape jobs against supported retailers. A job names a site, an entry URL
/// (a category listing or a single product) and two attribute labels to look up
/// on every product page. Results are stored in a SQLite job store.
#[derive(Parser, Debug)]
#[command(name = "storefront-harvester")]
#[command(version = "1.0.0")]
#[command(about = "On-demand product scraping for supported retailers", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Site key of a new job (see --list-sites)
    #[arg(long, requires = "url")]
    site: Option<String>,

    /// Entry URL of a new job: a listing or a single product
    #[arg(long, requires = "site")]
    url: Option<String>,

    /// First attribute label to extract
    #[arg(long, default_value = "")]
    tx1: String,

    /// Second attribute label to extract
    #[arg(long, default_value = "")]
    tx2: String,

    /// Run an already submitted pending job
    #[arg(long, value_name = "ID", conflicts_with_all = ["site", "status", "results"])]
    run: Option<i64>,

    /// Show a job's status and exit
    #[arg(long, value_name = "ID", conflicts_with_all = ["site", "results"])]
    status: Option<i64>,

    /// Print a job's records as JSON and exit
    #[arg(long, value_name = "ID", conflicts_with = "site")]
    results: Option<i64>,

    /// List supported sites and exit
    #[arg(long)]
    list_sites: bool,

    /// Validate config and show what would run without touching any site
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Arc::new(cfg)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let engines = build_engines(&config)?;
    let registry = Arc::new(default_registry(&config, &engines));

    if cli.list_sites {
        handle_list_sites(&registry);
        return Ok(());
    }
    if cli.dry_run {
        handle_dry_run(&config, &registry, &cli);
        return Ok(());
    }

    let store: SharedStore = Arc::new(Mutex::new(open_store(Path::new(
        &config.storage.database_path,
    ))?));
    let runner = JobRunner::new(registry, store);

    if let Some(id) = cli.status {
        handle_status(&runner, id)?;
    } else if let Some(id) = cli.results {
        handle_results(&runner, id)?;
    } else if let Some(id) = cli.run {
        handle_run(&runner, id).await?;
    } else if let (Some(site), Some(url)) = (&cli.site, &cli.url) {
        let id = runner.submit_job(site, url, &cli.tx1, &cli.tx2)?;
        println!("Submitted job {}", id);
        handle_run(&runner, id).await?;
    } else {
        return Err("nothing to do: pass --site and --url, --run, --status, --results or --list-sites".into());
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("storefront_harvester=info,warn"),
            1 => EnvFilter::new("storefront_harvester=debug,info"),
            2 => EnvFilter::new("storefront_harvester=trace,debug"),
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

fn handle_list_sites(registry: &ParserRegistry) {
    for capability in registry.capabilities() {
        println!("{:<12} {}", capability.key, capability.display_name);
    }
}

/// Handles the --dry-run mode: shows the effective configuration and the job that would run
fn handle_dry_run(config: &Config, registry: &ParserRegistry, cli: &Cli) {
    println!("=== Storefront Harvester Dry Run ===\n");

    println!("Harvester:");
    println!("  Workers per job: {}", config.harvester.workers);
    println!("  Max listing pages: {}", config.harvester.max_listing_pages);
    println!(
        "  Empty page streak: {} (after {} pages)",
        config.harvester.empty_page_streak, config.harvester.min_pages_before_stop
    );
    println!("  Page delay: {}ms", config.harvester.page_delay_ms);

    println!("\nChallenge handling:");
    println!("  Attempts: {}", config.challenge.attempts);
    println!("  Backoff: {}ms x attempt", config.challenge.backoff_ms);

    println!("\nBrowser:");
    println!("  Engines: {}", config.browser.engines.join(" -> "));
    println!("  Locale: {}", config.browser.locale);
    println!("  Navigation timeout: {}s", config.timeouts.navigation_secs);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nSites ({}):", registry.len());
    for capability in registry.capabilities() {
        println!("  - {} ({})", capability.key, capability.display_name);
    }

    println!("\n✓ Configuration is valid");
    if let (Some(site), Some(url)) = (&cli.site, &cli.url) {
        match registry.resolve(site) {
            Ok(adapter) => println!(
                "✓ Would scrape {} with {} (tx1='{}', tx2='{}')",
                url,
                adapter.display_name(),
                cli.tx1,
                cli.tx2
            ),
            Err(e) => println!("✗ {}", e),
        }
    }
}

fn handle_status(runner: &JobRunner, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let job = runner.job(id)?;
    println!("Job {}: {}", job.id, job.status);
    println!("  Site: {}", job.site);
    println!("  URL: {}", job.url);
    println!("  Created: {}", job.created_at);
    if let Some(finished) = &job.finished_at {
        println!("  Finished: {}", finished);
    }
    if let Some(error) = &job.error {
        println!("  Error: {}", error);
    }
    Ok(())
}

fn handle_results(runner: &JobRunner, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let records = runner.records(id)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

/// Runs a job on its own task and reports the outcome
async fn handle_run(runner: &JobRunner, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let status = runner.spawn(id).await??;
    match status {
        JobStatus::Done => {
            let count = runner.records(id)?.len();
            println!("✓ Job {} done: {} records", id, count);
        }
        _ => {
            let job = runner.job(id)?;
            println!(
                "✗ Job {} failed: {}",
                id,
                job.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    Ok(())
}
