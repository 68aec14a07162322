//! Sports betting arbitrage scanner entry point.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use surebet::api::{create_router, AppState};
use surebet::config::Config;
use surebet::error::ScannerError;
use surebet::feed::OddsApiClient;
use surebet::metrics;
use surebet::scanner::Scanner;
use surebet::store::OddsStore;
use surebet::utils::shutdown_signal;

/// Sports betting arbitrage scanner.
#[derive(Parser, Debug)]
#[command(name = "surebet")]
#[command(about = "Scans bookmaker odds for two-way arbitrage opportunities")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the periodic scan loop with the HTTP API (default).
    Run {
        /// HTTP server port for health/status/metrics.
        #[arg(short, long)]
        port: Option<u16>,

        /// Seconds between scans.
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Run a single scan and print the opportunities found.
    Scan,

    /// Print persisted opportunity history.
    History {
        /// History window in days.
        #[arg(short, long, default_value = "7")]
        days: u32,
    },

    /// List sports available from the odds provider.
    Sports,

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("surebet=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Handle subcommands
    match args.command {
        Some(Command::Run { port, interval }) => cmd_run(port, interval).await,
        Some(Command::Scan) => cmd_scan().await,
        Some(Command::History { days }) => cmd_history(days).await,
        Some(Command::Sports) => cmd_sports().await,
        Some(Command::CheckConfig) => cmd_check_config().await,
        None => cmd_run(None, None).await,
    }
}

/// Run the periodic scan loop with the HTTP API.
async fn cmd_run(port_override: Option<u16>, interval_override: Option<u64>) -> anyhow::Result<()> {
    // Load configuration
    info!("Loading configuration...");
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Override with CLI args if provided
    if let Some(port) = port_override {
        config.port = port;
    }
    if let Some(interval) = interval_override {
        config.scan_interval_seconds = interval;
    }

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    info!("Configuration loaded successfully");
    info!("Sport: {}", config.sport_key);
    info!("Minimum profit: {}%", config.min_profit_percent);
    info!("Total stake: ${}", config.total_stake);
    info!("Scan interval: {}s", config.scan_interval_seconds);

    // Open the store
    let store = OddsStore::open(&config.database_path)?;

    // Install the metrics recorder before describing metrics
    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {e}"))?;
    metrics::init_metrics();

    // Create app state
    let app_state = AppState::new(store.clone()).with_prometheus(prometheus);

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state.clone());

    // Spawn HTTP server
    let _server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    // Create scanner
    let scanner = Scanner::new(config.clone(), store);

    info!("Starting arbitrage scanner...");

    let mut interval = tokio::time::interval(Duration::from_secs(config.scan_interval_seconds));
    let mut scan_count = 0u64;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                scan_count += 1;

                match scanner.run_once().await {
                    Ok(summary) => {
                        info!(
                            "[Scan #{}] {} events, {} quotes, {} opportunities",
                            scan_count,
                            summary.events_seen,
                            summary.quotes_ingested,
                            summary.opportunities.len(),
                        );
                        app_state.record_scan(summary).await;
                    }
                    Err(ScannerError::Feed(e)) => {
                        metrics::inc_feed_failures();
                        warn!("Odds feed unavailable: {}. Waiting for next interval...", e);
                    }
                    Err(e) => {
                        warn!("Scan failed: {}", e);
                    }
                }
            }
            _ = shutdown_signal() => {
                info!("Stopping scanner");
                break;
            }
        }
    }

    Ok(())
}

/// Run a single scan and print the opportunities found.
async fn cmd_scan() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let store = OddsStore::open(&config.database_path)?;
    let scanner = Scanner::new(config.clone(), store);

    println!("======================================================================");
    println!("SUREBET - ONE-SHOT SCAN");
    println!("======================================================================");
    println!("Sport: {}", config.sport_key);
    println!("Minimum profit: {}%", config.min_profit_percent);
    println!("Total stake: ${}", config.total_stake);
    println!("----------------------------------------------------------------------");

    print!("Fetching odds... ");
    let summary = match scanner.run_once().await {
        Ok(summary) => {
            println!("OK");
            summary
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Scan failed"));
        }
    };

    println!(
        "Analyzed {} events, {} quotes",
        summary.events_seen, summary.quotes_ingested
    );
    println!("Found {} arbitrage opportunities", summary.opportunities.len());

    for (i, opp) in summary.opportunities.iter().enumerate() {
        println!("----------------------------------------------------------------------");
        println!("#{}: {} vs {}", i + 1, opp.home_team, opp.away_team);
        println!("  Starts: {}", opp.start_time);
        println!("  Profit: {}%", opp.profit_percent);
        println!(
            "  Bet ${} on {} at {} (odds: {})",
            opp.stake_home, opp.home_team, opp.bookmaker_home, opp.odds_home
        );
        println!(
            "  Bet ${} on {} at {} (odds: {})",
            opp.stake_away, opp.away_team, opp.bookmaker_away, opp.odds_away
        );
        println!("  Guaranteed profit: ${}", opp.guaranteed_profit);
    }

    println!("======================================================================");

    Ok(())
}

/// Print persisted opportunity history.
async fn cmd_history(days: u32) -> anyhow::Result<()> {
    let config = Config::load()?;
    let store = OddsStore::open(&config.database_path)?;

    let history = store.opportunity_history(days)?;

    println!("======================================================================");
    println!("SUREBET - OPPORTUNITY HISTORY (last {} days)", days);
    println!("======================================================================");

    if history.is_empty() {
        println!("No opportunities recorded. Keep the scanner running to build history.");
        println!("======================================================================");
        return Ok(());
    }

    for (i, opp) in history.iter().enumerate() {
        println!(
            "#{}: {} vs {} - {}% ({} / {}) detected {}",
            i + 1,
            opp.home_team,
            opp.away_team,
            opp.profit_percent,
            opp.bookmaker_home,
            opp.bookmaker_away,
            opp.detected_at,
        );
    }

    println!("----------------------------------------------------------------------");
    println!("Total: {} opportunities", history.len());
    println!("======================================================================");

    Ok(())
}

/// List sports available from the odds provider.
async fn cmd_sports() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let client = OddsApiClient::new(&config);

    println!("======================================================================");
    println!("SUREBET - AVAILABLE SPORTS");
    println!("======================================================================");

    let sports = client.list_sports().await?;

    for sport in &sports {
        println!(
            "  {:<32} {} {}",
            sport.key,
            sport.title,
            if sport.active { "(active)" } else { "" }
        );
    }

    println!("----------------------------------------------------------------------");
    println!("Total: {} sports", sports.len());
    println!("======================================================================");

    Ok(())
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("SUREBET - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Odds API URL: {}", config.odds_api_url);
    println!("  API Key: present");
    println!("  Sport: {}", config.sport_key);
    println!("  Regions: {}", config.regions);
    println!("  Minimum Profit: {}%", config.min_profit_percent);
    println!("  Total Stake: ${}", config.total_stake);
    println!("  Scan Interval: {}s", config.scan_interval_seconds);
    println!("  Database: {}", config.database_path);
    println!("  HTTP Port: {}", config.port);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}
