use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cafecrawl_client::KakaoClient;
use cafecrawl_core::models::CrawlSummary;
use cafecrawl_core::schedule::DEFAULT_JOB_NAME;
use cafecrawl_core::traits::{CafeStore, RunLog};
use cafecrawl_core::zone::{load_zones, seoul_districts, select_zones};
use cafecrawl_core::{
    CrawlScheduler, CrawlService, Pacer, ScheduleConfig, TracingCrawlReporter, Zone,
};
use cafecrawl_db::{CafeRepository, Database};

/// Exit status for a finished crawl that had failed zones.
const EXIT_ZONE_ERRORS: u8 = 2;

#[derive(Parser)]
#[command(name = "cafecrawl", version, about = "Café POI crawler for the Kakao Local API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ZoneArgs {
    /// Crawl only this zone (repeatable)
    #[arg(long = "zone")]
    zones: Vec<String>,

    /// JSON file with the zone catalog (defaults to the Seoul districts)
    #[arg(long)]
    zones_file: Option<PathBuf>,
}

#[derive(Args)]
struct CrawlArgs {
    #[command(flatten)]
    zones: ZoneArgs,

    /// Delay between API requests and between zones, in milliseconds
    #[arg(long, env = "CAFECRAWL_REQUEST_DELAY_MS", default_value_t = 300)]
    delay_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl every zone once and reconcile the results into the database
    Crawl {
        #[command(flatten)]
        args: CrawlArgs,

        /// Print the run summary as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Exit with status 2 if any zone failed
        #[arg(long, default_value_t = false)]
        fail_on_zone_errors: bool,
    },

    /// Crawl periodically until interrupted
    Schedule {
        #[command(flatten)]
        args: CrawlArgs,

        /// Seconds between the starts of consecutive runs
        #[arg(long, default_value_t = 86_400)]
        interval_secs: u64,

        /// Wait one interval before the first run
        #[arg(long, default_value_t = false)]
        skip_initial: bool,
    },

    /// Show recent crawl runs
    History {
        /// Number of runs to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// List stored cafés
    Cafes {
        /// Only cafés attributed to this zone
        #[arg(long)]
        zone: Option<String>,

        /// Number of cafés to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Export stored cafés as CSV
    Export {
        /// Output file
        #[arg(short, long)]
        out: PathBuf,

        /// Only cafés attributed to this zone
        #[arg(long)]
        zone: Option<String>,
    },

    /// Print the zone catalog
    Zones {
        /// JSON file with the zone catalog (defaults to the Seoul districts)
        #[arg(long)]
        zones_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("cafecrawl=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl {
            args,
            json,
            fail_on_zone_errors,
        } => {
            let summary = cmd_crawl(&args).await?;
            print_summary(&summary, json)?;
            if fail_on_zone_errors && summary.has_failures() {
                return Ok(ExitCode::from(EXIT_ZONE_ERRORS));
            }
        }
        Commands::Schedule {
            args,
            interval_secs,
            skip_initial,
        } => {
            anyhow::ensure!(interval_secs > 0, "--interval-secs must be positive");
            cmd_schedule(&args, Duration::from_secs(interval_secs), skip_initial).await?;
        }
        Commands::History { limit } => {
            let db = connect_db().await?;
            cmd_history(&db, limit).await?;
        }
        Commands::Cafes { zone, limit } => {
            let db = connect_db().await?;
            cmd_cafes(&db.cafe_repo(), zone.as_deref(), limit).await?;
        }
        Commands::Export { out, zone } => {
            let db = connect_db().await?;
            cmd_export(&db.cafe_repo(), &out, zone.as_deref()).await?;
        }
        Commands::Zones { zones_file } => {
            let zones = resolve_zones(&ZoneArgs {
                zones: vec![],
                zones_file,
            })?;
            for zone in &zones {
                println!("{}\t{:.4}\t{:.4}", zone.name, zone.longitude, zone.latitude);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Connect to PostgreSQL using DATABASE_URL and apply migrations.
async fn connect_db() -> Result<Database> {
    Database::from_env()
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to open database")
}

fn resolve_zones(args: &ZoneArgs) -> Result<Vec<Zone>> {
    let catalog = match &args.zones_file {
        Some(path) => load_zones(path).map_err(|e| anyhow::anyhow!(e))?,
        None => seoul_districts(),
    };
    select_zones(catalog, &args.zones).map_err(|e| anyhow::anyhow!(e))
}

/// Cancel the returned token on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing the current zone");
            trigger.cancel();
        }
    });
    cancel
}

async fn build_service(args: &CrawlArgs) -> Result<(CrawlService<KakaoClient, CafeRepository>, Database)> {
    let client = KakaoClient::from_env()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to configure Kakao client")?;
    let db = connect_db().await?;
    let pacer = Pacer::new(Duration::from_millis(args.delay_ms));
    Ok((CrawlService::new(client, db.cafe_repo(), pacer), db))
}

async fn cmd_crawl(args: &CrawlArgs) -> Result<CrawlSummary> {
    let zones = resolve_zones(&args.zones)?;
    let (service, db) = build_service(args).await?;
    let cancel = cancel_on_ctrl_c();

    let summary = service.run(&zones, &cancel, &TracingCrawlReporter).await;

    if let Err(e) = db.run_repo().record_run(DEFAULT_JOB_NAME, &summary).await {
        tracing::error!(error = %e, "Failed to record crawl run");
    }

    Ok(summary)
}

async fn cmd_schedule(args: &CrawlArgs, interval: Duration, skip_initial: bool) -> Result<()> {
    let zones = resolve_zones(&args.zones)?;
    let (service, db) = build_service(args).await?;
    let config = ScheduleConfig {
        interval,
        run_immediately: !skip_initial,
        ..ScheduleConfig::default()
    };

    let scheduler = CrawlScheduler::new(service, db.run_repo(), zones, config);
    let runs = scheduler
        .run(cancel_on_ctrl_c(), &TracingCrawlReporter)
        .await;
    println!("Scheduler stopped after {runs} run(s)");
    Ok(())
}

fn print_summary(summary: &CrawlSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("Crawl finished in {:.1}s", summary.elapsed_seconds);
    println!("  fetched:  {}", summary.total_fetched);
    println!("  inserted: {}", summary.inserted);
    println!("  updated:  {}", summary.updated);
    if summary.has_failures() {
        println!("  failed zones: {}", summary.failed_zones.join(", "));
    }
    if summary.cancelled {
        println!("  (cancelled before all zones were crawled)");
    }
    Ok(())
}

async fn cmd_history(db: &Database, limit: usize) -> Result<()> {
    let runs = db
        .run_repo()
        .recent_runs(DEFAULT_JOB_NAME, limit)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if runs.is_empty() {
        println!("No crawl runs recorded");
        return Ok(());
    }

    println!("Recent crawl runs:\n");
    for run in &runs {
        let failed = if run.failed_zones.is_empty() {
            String::new()
        } else {
            format!(", failed: {}", run.failed_zones.join(", "))
        };
        println!(
            "  {} fetched {} (+{} new, {} updated) in {:.1}s{}{}",
            run.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            run.total_fetched,
            run.inserted,
            run.updated,
            run.elapsed_seconds,
            failed,
            if run.cancelled { " [cancelled]" } else { "" },
        );
    }

    println!("\nTotal: {} runs", runs.len());
    Ok(())
}

async fn cmd_cafes(repo: &CafeRepository, zone: Option<&str>, limit: usize) -> Result<()> {
    let cafes = match zone {
        Some(zone) => repo.list_by_zone(zone, limit).await,
        None => repo.list_recent(limit).await,
    }
    .map_err(|e| anyhow::anyhow!(e))?;

    for cafe in &cafes {
        println!(
            "{}\t{}\t{}\t{}",
            cafe.external_id, cafe.zone, cafe.name, cafe.address
        );
    }

    let total = repo.count().await.map_err(|e| anyhow::anyhow!(e))?;
    println!("\nShowing {} of {} cafés", cafes.len(), total);
    Ok(())
}

async fn cmd_export(repo: &CafeRepository, out: &Path, zone: Option<&str>) -> Result<()> {
    let cafes = repo.list_all(zone).await.map_err(|e| anyhow::anyhow!(e))?;

    let mut writer = csv::Writer::from_path(out)
        .with_context(|| format!("Failed to create {}", out.display()))?;
    for cafe in &cafes {
        writer.serialize(cafe)?;
    }
    writer.flush()?;

    tracing::info!(rows = cafes.len(), path = %out.display(), "Export complete");
    Ok(())
}
