mod config;
mod db;
mod error;
mod fallback;
mod fetch;
mod model;
mod parser;
mod server;
mod service;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use clap::{Parser, Subcommand};

use config::AppConfig;
use db::{RequestInfo, SnapshotStore, SqliteStore};
use fetch::{HttpFetcher, FETCH_TIMEOUT};
use model::{Site, Status};
use service::{StatusService, FRESHNESS_WINDOW};

#[derive(Parser)]
#[command(
    name = "resort_status",
    about = "Lift and trail status for Snow Valley, Snow Summit and Bear Mountain"
)]
struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service (default)
    Serve,
    /// Answer one status request and print the JSON body
    Fetch {
        /// Skip the stored snapshot even if it is fresh
        #[arg(short, long)]
        force: bool,
    },
    /// Show the stored snapshot's age and per-site counts
    Latest,
    /// Show store statistics
    Stats,
}

type Service = StatusService<HttpFetcher, SqliteStore>;

fn build_service(config: &AppConfig) -> anyhow::Result<Service> {
    let fetcher = HttpFetcher::new(&config.source_url, config.source_token.clone(), FETCH_TIMEOUT)?;
    let store = SqliteStore::connect(&config.db_path)?;
    Ok(StatusService::new(fetcher, store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let config = cli.config;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let service = Arc::new(build_service(&config)?);
            server::serve(service, &config).await?;
            return Ok(());
        }
        Commands::Fetch { force } => {
            let service = build_service(&config)?;
            let request = RequestInfo {
                force,
                origin: None,
                user_agent: Some(concat!("resort_status/", env!("CARGO_PKG_VERSION")).to_string()),
            };
            let snapshot = service.obtain(force, &request).await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::Latest => {
            let store = SqliteStore::connect(&config.db_path)?;
            let Some(stored) = store.latest()? else {
                println!("No snapshot stored yet. Run 'fetch' first.");
                return Ok(());
            };
            let age_ms = (Utc::now() - stored.created_at).num_milliseconds().max(0);
            let state = if age_ms < FRESHNESS_WINDOW.as_millis() as i64 { "fresh" } else { "stale" };
            let age = service::rounded_secs(age_ms);
            println!(
                "Snapshot #{} taken {} ({}s old, {})",
                stored.id,
                stored.timestamp.to_rfc3339(),
                age,
                state
            );
            println!("{:<14} | {:>5} | {:>9} | {:>6}", "Site", "Lifts", "Open", "Trails");
            println!("{}", "-".repeat(44));
            for site in Site::ALL {
                let Some(report) = stored.locations.get(&site) else {
                    continue;
                };
                let open = report.lifts.iter().filter(|r| r.status == Status::Open).count();
                println!(
                    "{:<14} | {:>5} | {:>9} | {:>6}",
                    site.display_name(),
                    report.lifts.len(),
                    open,
                    report.trails.len()
                );
            }
        }
        Commands::Stats => {
            let store = SqliteStore::connect(&config.db_path)?;
            let s = store.stats()?;
            println!("Snapshots: {}", s.snapshots);
            println!("Responses: {}", s.responses);
            println!("Errors:    {}", s.errors);
            if let Some((at, context, message)) = s.last_error {
                println!("Last error ({} at {}): {}", context, at, message);
            }
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
