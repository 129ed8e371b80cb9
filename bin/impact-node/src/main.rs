//! Glow Impact Node
//!
//! Runs the impact score engine against the Control API, the claims indexer
//! and an RPC node, and keeps the leaderboard snapshots fresh:
//! - refresh: one steering sync plus one leaderboard refresh
//! - run: refresh on an interval until Ctrl+C
//! - score / leaderboard / delegators: one-off queries printed as JSON
//! - sync-steering: warm the steering snapshot cache

mod config;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use config::NodeConfig;
use glow_control_client::{
    ClaimsIndexerClient, ControlApiClient, RpcBalanceClient, SplitHoldersFeed, StakersFeed,
};
use glow_leaderboard::{
    LeaderboardMetrics, LeaderboardQuery, LeaderboardService, Materializer, SteeringSync,
    WalletUniverse,
};
use glow_primitives::{Clock, SystemClock, Week};
use glow_scoring::{ScoreOptions, ScoringEngine, ScoringMetrics, ScoringSources};
use glow_storage::{SnapshotStore, StorageManager, StorageMetrics};
use glow_types::{LeaderboardSortKey, WalletAddress, WeekRange};
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "impact-node")]
#[command(about = "Glow impact score and leaderboard node", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file path
    #[arg(short, long, default_value = "impact-node.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Sync steering, then rebuild and store both leaderboards once
    Refresh,
    /// Refresh on the configured interval until interrupted
    Run,
    /// Print one wallet's impact score as JSON
    Score {
        wallet: String,
        #[arg(long)]
        start_week: Option<Week>,
        #[arg(long)]
        end_week: Option<Week>,
        /// Include the per-week breakdown
        #[arg(long)]
        weekly: bool,
        /// Also project the week in progress
        #[arg(long)]
        project: bool,
    },
    /// Print a page of the impact leaderboard as JSON
    Leaderboard {
        #[arg(long)]
        start_week: Option<Week>,
        #[arg(long)]
        end_week: Option<Week>,
        #[arg(long)]
        limit: Option<usize>,
        /// totalPoints, glowWorth, lastWeekPoints, steeringPoints,
        /// inflationPoints, vaultPoints or worthPoints
        #[arg(long, default_value = "totalPoints")]
        sort: LeaderboardSortKey,
        #[arg(long)]
        weekly: bool,
    },
    /// Print the delegators leaderboard as JSON
    Delegators {
        #[arg(long)]
        start_week: Option<Week>,
        #[arg(long)]
        end_week: Option<Week>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Pull recent steering epochs into the snapshot cache
    SyncSteering,
}

/// Everything a command needs, wired once at startup.
struct Node {
    engine: Arc<ScoringEngine>,
    service: LeaderboardService,
    sync: SteeringSync,
    registry: Registry,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level, cli.json_logs)?;

    info!("Starting Glow impact node");
    info!("Config: {}", cli.config);

    let config = NodeConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config))?;
    config.validate()?;

    let node = build_node(&config).await?;

    match cli.command {
        Command::Refresh => refresh_cycle(&node).await?,
        Command::Run => run_loop(&node, &config).await,
        Command::Score {
            wallet,
            start_week,
            end_week,
            weekly,
            project,
        } => {
            let wallet = WalletAddress::parse(&wallet).map_err(|e| anyhow!("{e}"))?;
            let range = week_range(start_week, end_week, node.service.materializer().default_range())?;
            let result = node
                .engine
                .compute_score(&wallet, range, ScoreOptions { include_weekly: weekly })
                .await?;
            print_json(&result)?;
            if project {
                let projection = node.engine.project_current_week(&wallet, range).await?;
                print_json(&projection)?;
            }
        }
        Command::Leaderboard {
            start_week,
            end_week,
            limit,
            sort,
            weekly,
        } => {
            let range = optional_range(start_week, end_week, &node)?;
            let page = node
                .service
                .impact(LeaderboardQuery {
                    range,
                    limit,
                    sort,
                    include_weekly: weekly,
                })
                .await?;
            print_json(&page)?;
        }
        Command::Delegators {
            start_week,
            end_week,
            limit,
        } => {
            let range = optional_range(start_week, end_week, &node)?;
            let snapshot = node.service.delegators(range, limit).await?;
            print_json(&snapshot)?;
        }
        Command::SyncSteering => {
            let report = node.sync.run().await?;
            print_json(&report)?;
        }
    }

    Ok(())
}

fn setup_logging(level: &str, json: bool) -> Result<()> {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

async fn build_node(config: &NodeConfig) -> Result<Node> {
    let registry = Registry::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let storage_metrics = Arc::new(StorageMetrics::new(&registry)?);
    let storage = StorageManager::connect_with_metrics(config.storage.clone(), storage_metrics).await?;

    let control = Arc::new(ControlApiClient::new(&config.client, clock.clone())?);
    let claims = Arc::new(ClaimsIndexerClient::new(&config.client)?);
    let rpc = Arc::new(RpcBalanceClient::new(&config.client)?);

    let sources = ScoringSources {
        rewards: control.clone(),
        claims: claims.clone(),
        liquid: rpc,
        balances: storage.balances(),
        steering: control.clone(),
        steering_cache: Some(storage.steering_cache()),
        purchases: storage.purchases(),
    };
    let engine = Arc::new(
        ScoringEngine::new(sources, config.scoring.clone(), clock.clone())
            .with_metrics(Arc::new(ScoringMetrics::new(&registry)?)),
    );

    let universe = WalletUniverse::new(vec![
        storage.purchasers(),
        Arc::new(SplitHoldersFeed(control.clone())),
        claims,
        Arc::new(StakersFeed(control.clone())),
    ]);
    info!(feeds = ?universe.feed_names(), "wallet universe configured");

    let store: Arc<dyn SnapshotStore> = Arc::new(storage.clone());
    let materializer = Arc::new(
        Materializer::new(engine.clone(), universe, store, config.leaderboard.clone())
            .with_metrics(Arc::new(LeaderboardMetrics::new(&registry)?)),
    );

    let sync = SteeringSync::new(
        control.clone(),
        storage.steering_cache(),
        &config.scoring.foundation_wallets,
        clock,
        config.leaderboard.steering_sync.clone(),
    )
    .with_stakers(Arc::new(StakersFeed(control)));

    Ok(Node {
        engine,
        service: LeaderboardService::new(materializer),
        sync,
        registry,
    })
}

/// Steering sync (best effort) followed by both leaderboard refreshes.
async fn refresh_cycle(node: &Node) -> Result<()> {
    if let Err(e) = node.sync.run().await {
        warn!(error = %e, "steering sync failed, refreshing from upstream");
    }
    let (impact, delegators) = node.service.refresh().await?;
    info!(
        impact_rows = impact.rows.len(),
        delegator_rows = delegators.rows.len(),
        start_week = impact.week_range.start_week,
        end_week = impact.week_range.end_week,
        "refresh cycle complete"
    );
    debug!(metrics = %render_metrics(&node.registry), "metrics after refresh");
    Ok(())
}

async fn run_loop(node: &Node, config: &NodeConfig) {
    info!(interval = ?config.refresh_interval, "refresh loop started");
    loop {
        if let Err(e) = refresh_cycle(node).await {
            error!(error = %e, "refresh cycle failed");
        }
        tokio::select! {
            _ = tokio::time::sleep(config.refresh_interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }
}

fn week_range(start: Option<Week>, end: Option<Week>, default: WeekRange) -> Result<WeekRange> {
    let range = WeekRange::new(
        start.unwrap_or(default.start_week),
        end.unwrap_or(default.end_week),
    )?;
    Ok(range)
}

fn optional_range(start: Option<Week>, end: Option<Week>, node: &Node) -> Result<Option<WeekRange>> {
    if start.is_none() && end.is_none() {
        return Ok(None);
    }
    week_range(start, end, node.service.materializer().default_range()).map(Some)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_metrics(registry: &Registry) -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&registry.gather(), &mut buffer) {
        return format!("metrics unavailable: {e}");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_range_fills_missing_bound() {
        let default = WeekRange::new(97, 120).unwrap();
        assert_eq!(week_range(Some(100), None, default).unwrap(), WeekRange::new(100, 120).unwrap());
        assert_eq!(week_range(None, Some(99), default).unwrap(), WeekRange::new(97, 99).unwrap());
        assert!(week_range(Some(110), Some(100), default).is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "impact-node",
            "--config",
            "node.toml",
            "leaderboard",
            "--sort",
            "glowWorth",
            "--limit",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.config, "node.toml");
        match cli.command {
            Command::Leaderboard { sort, limit, .. } => {
                assert_eq!(sort, LeaderboardSortKey::GlowWorth);
                assert_eq!(limit, Some(10));
            }
            _ => panic!("expected leaderboard"),
        }
    }
}
