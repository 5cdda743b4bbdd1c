//! Command line entry point: resolve a keyword or person into a movie
//! batch, acquire it, and wire the results into a collection and channel.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use projektor_core::batch::{channel_name, BatchRunner, MovieTask};
use projektor_core::catalog::{CatalogService, KeywordMatch, TmdbClient};
use projektor_core::channel::{ChannelService, TunarrClient};
use projektor_core::config::Config;
use projektor_core::debrid::{ActivationPipeline, DebridClient, RealDebridClient};
use projektor_core::library::{JellyfinClient, LibraryService};
use projektor_core::proxy::{HttpFactory, ProxyRotator};
use projektor_core::search::sites::{
    LimeTorrentsAdapter, PirateBayAdapter, X1337Adapter, YtsAdapter,
};
use projektor_core::search::{QualityPolicy, SearchAggregator, SiteAdapter};
use projektor_core::{load_config, validate_config, SanitizedConfig};

#[derive(Parser)]
#[command(name = "projektor", version, about = "Movie batch acquisition and channel automation")]
struct Args {
    /// Build a batch from movies tagged with this keyword
    #[arg(short = 'k', long, conflicts_with = "person")]
    keyword: Option<String>,

    /// Build a batch from an actor's filmography
    #[arg(short = 'p', long)]
    person: Option<String>,

    /// Maximum movies in the batch (default from config)
    #[arg(long)]
    limit: Option<usize>,

    /// Concurrent movie workers (default from config)
    #[arg(long)]
    workers: Option<usize>,

    /// Answer yes to every prompt
    #[arg(short = 'y', long)]
    yes: bool,

    /// Remove duplicate library items and torrents, then exit
    #[arg(long)]
    cleanup: bool,

    /// Probe the proxy pool and exit
    #[arg(long)]
    test_proxies: bool,

    /// Configuration file
    #[arg(short = 'c', long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Loading configuration from {:?}", args.config);
    let config = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    validate_config(&config).context("Configuration validation failed")?;
    debug!(
        "Effective configuration: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    let rotator = build_rotator(&config)?;

    if args.test_proxies {
        let rotator = match rotator {
            Some(r) => r,
            None => bail!("Proxy support is disabled in the configuration"),
        };
        info!("Probing proxy pool...");
        let alive = rotator.test_proxies().await;
        println!("{} live proxies in pool", alive);
        return Ok(());
    }

    let catalog: Arc<dyn CatalogService> = Arc::new(
        TmdbClient::new(config.catalog.clone()).context("Failed to build catalog client")?,
    );
    let runner = build_runner(&config, &args, rotator.clone(), Arc::clone(&catalog)).await?;

    if args.cleanup {
        let report = runner.cleanup().await?;
        println!(
            "Cleanup done: {} library items removed, {} torrents removed",
            report.library_items_removed, report.torrents_removed
        );
        return Ok(());
    }

    let limit = args.limit.unwrap_or(config.batch.movie_limit);
    let (subject, tasks) = resolve_batch(&runner, catalog.as_ref(), &args, limit).await?;
    if tasks.is_empty() {
        bail!("No movies found for '{}'", subject);
    }

    println!("Batch for '{}' ({} movies):", subject, tasks.len());
    for task in &tasks {
        match task.year {
            Some(year) => println!("  {} ({})", task.title, year),
            None => println!("  {}", task.title),
        }
    }
    if !args.yes && !prompt_yes("Proceed?")? {
        println!("Aborted.");
        return Ok(());
    }

    let report = runner.acquire_movies(&tasks).await;
    println!(
        "Acquired {} of {} movies ({} already owned, {} without candidates, {} failed)",
        report.succeeded(),
        report.attempted,
        report.skipped_existing,
        report.no_candidates + report.exhausted,
        report.failed.len()
    );
    for (title, message) in &report.failed {
        warn!("'{}' failed: {}", title, message);
    }

    runner.refresh_library().await?;

    let added = runner.populate_collection(&subject, &tasks).await?;
    let group = if args.person.is_some() { "Filmography" } else { "Movies" };
    let programmed = runner
        .program_channel(&channel_name(&subject), group, &tasks)
        .await?;
    println!(
        "Collection '{}': {} items added; channel '{}': {} programs appended",
        subject,
        added,
        channel_name(&subject),
        programmed
    );

    Ok(())
}

/// Build the proxy rotator, or None when proxying is disabled.
fn build_rotator(config: &Config) -> Result<Option<Arc<ProxyRotator>>> {
    if !config.proxy.enabled {
        return Ok(None);
    }
    let rotator = if config.proxy.static_list.is_empty() {
        ProxyRotator::new(
            config.proxy.provider_url.clone(),
            config.proxy.echo_url.clone(),
            Duration::from_secs(config.proxy.refresh_secs),
        )
    } else {
        ProxyRotator::with_static_pool(
            config.proxy.static_list.clone(),
            config.proxy.echo_url.clone(),
        )
    }
    .context("Failed to build proxy rotator")?;
    Ok(Some(Arc::new(rotator)))
}

/// Wire the full service stack into a batch runner.
async fn build_runner(
    config: &Config,
    args: &Args,
    rotator: Option<Arc<ProxyRotator>>,
    catalog: Arc<dyn CatalogService>,
) -> Result<BatchRunner> {
    let timeout = Duration::from_secs(config.search.timeout_secs);
    let http = Arc::new(match rotator {
        Some(rotator) => HttpFactory::with_rotator(rotator, timeout),
        None => HttpFactory::direct(timeout),
    });
    let policy = Arc::new(config.search.quality.clone());

    let adapters = build_adapters(config, &http, &policy);
    if adapters.is_empty() {
        bail!("Every search site is disabled in the configuration");
    }
    let aggregator =
        Arc::new(SearchAggregator::new(adapters).with_concurrency(config.search.concurrency));

    let debrid: Arc<dyn DebridClient> = Arc::new(
        RealDebridClient::new(config.debrid.clone()).context("Failed to build debrid client")?,
    );
    let account = debrid
        .account()
        .await
        .context("Debrid account check failed")?;
    if !account.premium {
        warn!(
            "Debrid account '{}' is not premium; fetches may be restricted",
            account.username
        );
    }
    info!("Debrid account: {}", account.username);

    let pipeline = Arc::new(
        ActivationPipeline::new(Arc::clone(&debrid))
            .with_active_limit(config.batch.active_limit),
    );

    let library: Arc<dyn LibraryService> = Arc::new(
        JellyfinClient::new(config.library.clone()).context("Failed to build library client")?,
    );
    let channel: Arc<dyn ChannelService> = Arc::new(
        TunarrClient::new(config.channel.clone()).context("Failed to build channel client")?,
    );

    Ok(
        BatchRunner::new(catalog, library, channel, debrid, aggregator, pipeline)
            .with_workers(args.workers.unwrap_or(config.batch.workers))
            .with_active_limit(config.batch.active_limit),
    )
}

fn build_adapters(
    config: &Config,
    http: &Arc<HttpFactory>,
    policy: &Arc<QualityPolicy>,
) -> Vec<Arc<dyn SiteAdapter>> {
    let search = &config.search;
    let mut adapters: Vec<Arc<dyn SiteAdapter>> = Vec::new();

    if search.enable_x1337 {
        let mut adapter = X1337Adapter::new(Arc::clone(http), Arc::clone(policy));
        if let Some(url) = &search.x1337_url {
            adapter = adapter.with_base_url(url);
        }
        adapters.push(Arc::new(adapter));
    }
    if search.enable_yts {
        let mut adapter = YtsAdapter::new(Arc::clone(http), Arc::clone(policy));
        if let Some(url) = &search.yts_url {
            adapter = adapter.with_base_url(url);
        }
        adapters.push(Arc::new(adapter));
    }
    if search.enable_piratebay {
        let mut adapter = PirateBayAdapter::new(Arc::clone(http), Arc::clone(policy));
        if let Some(url) = &search.piratebay_url {
            adapter = adapter.with_base_url(url);
        }
        adapters.push(Arc::new(adapter));
    }
    if search.enable_limetorrents {
        let mut adapter = LimeTorrentsAdapter::new(Arc::clone(http), Arc::clone(policy));
        if let Some(url) = &search.limetorrents_url {
            adapter = adapter.with_base_url(url);
        }
        adapters.push(Arc::new(adapter));
    }

    adapters
}

/// Turn the keyword/person argument into a subject name and task list.
async fn resolve_batch(
    runner: &BatchRunner,
    catalog: &dyn CatalogService,
    args: &Args,
    limit: usize,
) -> Result<(String, Vec<MovieTask>)> {
    if let Some(keyword) = &args.keyword {
        let matches = catalog.search_keywords(keyword).await?;
        if matches.is_empty() {
            bail!("No keyword matches for '{}'", keyword);
        }
        let chosen = if args.yes || matches.len() == 1 {
            matches.into_iter().next().context("empty keyword list")?
        } else {
            pick_keyword(matches)?
        };
        info!("Using keyword '{}' ({})", chosen.name, chosen.id);
        let tasks = runner.movies_for_keyword(chosen.id, limit).await?;
        return Ok((chosen.name, tasks));
    }

    if let Some(person) = &args.person {
        let matches = catalog.search_people(person).await?;
        if matches.is_empty() {
            bail!("No person matches for '{}'", person);
        }
        // Same-named people are common; the one with the most movie
        // credits is the one meant.
        let chosen = runner
            .most_prolific_person(&matches)
            .await?
            .context("empty person list")?;
        if !args.yes && !prompt_yes(&format!("Use '{}'?", chosen.name))? {
            bail!("No person selected");
        }
        info!("Using person '{}' ({})", chosen.name, chosen.id);
        let tasks = runner.movies_for_person(chosen.id, limit).await?;
        return Ok((chosen.name, tasks));
    }

    bail!("Nothing to do: pass --keyword, --person, --cleanup or --test-proxies")
}

/// Interactive keyword disambiguation.
fn pick_keyword(matches: Vec<KeywordMatch>) -> Result<KeywordMatch> {
    println!("Multiple keyword matches:");
    for (idx, keyword) in matches.iter().enumerate() {
        println!("  [{}] {}", idx + 1, keyword.name);
    }
    print!("Pick one (1-{}): ", matches.len());
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let choice: usize = line
        .trim()
        .parse()
        .context("Expected a number from the list")?;
    if choice == 0 || choice > matches.len() {
        bail!("Choice {} is out of range", choice);
    }
    Ok(matches.into_iter().nth(choice - 1).context("empty keyword list")?)
}

fn prompt_yes(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}
