//! Site-Scout main entry point
//!
//! This is the command-line interface for site content acquisition and
//! discovery.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use site_scout::config::{load_config_with_hash, validate, Config};
use site_scout::crawler::{DomainCrawler, PageFetcher, PageSource};
use site_scout::output::{render, write_output, MarkdownReport, OutputFormat};
use site_scout::{BatchAuditRunner, CompetitorChain, SiteDiscovery, SurveyError};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Site-Scout: content acquisition and discovery for site audits
///
/// Site-Scout fetches pages as normalized markdown, enumerates a site's URLs
/// from its sitemap (falling back to a same-host crawl), runs batch page
/// audits and looks up competitors.
#[derive(Parser, Debug)]
#[command(name = "site-scout")]
#[command(version = "1.0.0")]
#[command(about = "Content acquisition and site discovery for audits", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one page as markdown
    Fetch {
        url: String,
    },

    /// Discover a site's URLs (sitemap first, crawl fallback)
    Urls {
        url: String,

        /// Maximum number of URLs returned
        #[arg(long)]
        max_urls: Option<usize>,
    },

    /// Crawl a site breadth-first, staying on its host
    Crawl {
        url: String,

        /// Maximum number of pages fetched
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Audit a site's pages for content chunks and contact data
    Batch {
        url: String,

        /// Maximum number of pages audited (0 = up to 500)
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Look up competitors of a domain
    Competitors {
        domain: String,

        /// Search context; defaults to the domain
        #[arg(long, default_value = "")]
        query: String,

        /// Maximum number of competitors returned
        #[arg(long)]
        max_results: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(&cli)?;

    match &cli.command {
        Command::Fetch { url } => {
            let fetcher = PageFetcher::from_config(&config)?;
            if !fetcher.has_backend() {
                tracing::warn!("No fetch strategy is enabled in the configuration");
            }
            let page = until_interrupted(async { Ok::<_, SurveyError>(fetcher.fetch(url).await) }).await?;
            emit(&cli, &page)?;
        }
        Command::Urls { url, max_urls } => {
            let discovery = SiteDiscovery::from_config(&config)?;
            let max_urls = max_urls.unwrap_or(config.discovery.max_urls);
            let result = until_interrupted(discovery.discover(url, max_urls))
                .await
                .with_context(|| format!("URL discovery failed for {}", url))?;
            emit(&cli, &result)?;
        }
        Command::Crawl { url, limit } => {
            let source: Arc<dyn PageSource> = Arc::new(PageFetcher::from_config(&config)?);
            let crawler = DomainCrawler::new(source);
            let limit = limit.unwrap_or(config.discovery.crawl_limit);
            let report = until_interrupted(crawler.crawl(url, limit))
                .await
                .with_context(|| format!("Crawl failed for {}", url))?;
            emit(&cli, &report)?;
        }
        Command::Batch { url, max_pages } => {
            let runner = BatchAuditRunner::from_config(&config)?;
            let max_pages = max_pages.unwrap_or(config.batch.max_pages);
            let result = until_interrupted(runner.run(url, max_pages))
                .await
                .with_context(|| format!("Batch audit failed for {}", url))?;
            emit(&cli, &result)?;
        }
        Command::Competitors {
            domain,
            query,
            max_results,
        } => {
            let chain = CompetitorChain::from_config(&config)?;
            let max_results = max_results.unwrap_or(config.competitors.max_results);
            let result = until_interrupted(chain.find_competitors(domain, query, max_results))
                .await
                .with_context(|| format!("Competitor lookup failed for {}", domain))?;
            emit(&cli, &result)?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that stdout carries only the rendered result.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_scout=info,warn"),
            1 => EnvFilter::new("site_scout=debug,info"),
            2 => EnvFilter::new("site_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or validated defaults when none is given
fn load(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            let config = Config::default();
            validate(&config).context("Default configuration is invalid")?;
            tracing::debug!("No configuration file given, using defaults");
            Ok(config)
        }
    }
}

/// Runs an operation until it completes or Ctrl-C is pressed
///
/// On interrupt the operation future is dropped, which aborts in-flight
/// requests and discards all crawl state.
async fn until_interrupted<T, F>(operation: F) -> anyhow::Result<T>
where
    F: Future<Output = site_scout::Result<T>>,
{
    tokio::select! {
        result = operation => Ok(result?),
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, abandoning operation");
            bail!("interrupted")
        }
    }
}

fn emit<T>(cli: &Cli, value: &T) -> anyhow::Result<()>
where
    T: Serialize + MarkdownReport,
{
    let content = render(value, cli.format)?;
    write_output(&content, cli.output.as_deref())?;
    Ok(())
}
