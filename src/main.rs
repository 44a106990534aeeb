use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codingball_ranking::api::{build_router, cors_layer, state::AppState};
use codingball_ranking::config::AppConfig;
use codingball_ranking::leaderboard::Navigation;
use codingball_ranking::models::{date_of_day_timestamp, DayAndGames, Opponent};
use codingball_ranking::parse_duration;
use codingball_ranking::source::{load_leaderboard, JsonlDataSource, OnlineDataSource};
use codingball_ranking::storage::{merge_games, StorageConfig};

#[derive(Parser)]
#[command(name = "codingball-ranking")]
#[command(about = "Online opponents leaderboard for the football coding game")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Signed-in player id (overrides config)
    #[arg(long)]
    own_id: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the leaderboard
    Rank {
        /// Only show the first N rows
        #[arg(long)]
        limit: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Search the leaderboard by player name
    Search {
        /// Name fragment, accents and case are ignored
        query: String,
    },

    /// Decide whether a game against an opponent may start
    Play {
        /// Opponent id
        opponent: String,

        /// Confirm replaying an opponent already played today
        #[arg(long)]
        yes: bool,
    },

    /// Change your nickname on the leaderboard
    Rename {
        /// New display name
        name: String,
    },

    /// Import a backend export (JSON array of days) into the store
    Import {
        /// Path to the export file
        path: PathBuf,
    },

    /// Drop days older than the retention window
    Prune,

    /// Start the API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Rebuild the leaderboard periodically (e.g., "5m", "90s")
        #[arg(long)]
        refresh_interval: Option<String>,
    },
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(id) = &cli.own_id {
        config.own_id = id.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn data_source(config: &AppConfig) -> JsonlDataSource {
    JsonlDataSource::new(
        StorageConfig::new(config.data_dir.clone()),
        config.own_id.as_str().into(),
    )
    .with_retention_days(config.retention_days)
}

fn print_table(rows: &[Opponent], own_id: &str) {
    println!(
        "{:>5}  {:>6}  {:<24}  {:<10}  {}",
        "Rank", "Points", "Player", "Last seen", "Id"
    );
    for row in rows {
        let marker = if row.webcom_id.as_str() == own_id { "*" } else { " " };
        let last_seen = date_of_day_timestamp(row.last_seen)
            .map(|d| d.to_string())
            .unwrap_or_default();
        println!(
            "{:>5}{} {:>6}  {:<24}  {:<10}  {}",
            row.ranking,
            marker,
            row.points,
            row.display_name(),
            last_seen,
            row.webcom_id
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_tracing(&config.log_level, cli.json_logs);
    tracing::info!("Starting codingball-ranking v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Rank { limit, json } => {
            config.validate_signed_in()?;
            let board = load_leaderboard(&data_source(&config)).await?;
            let rows = board.ranked_opponents();
            let rows = &rows[..limit.unwrap_or(rows.len()).min(rows.len())];

            if json {
                println!("{}", serde_json::to_string_pretty(rows)?);
            } else {
                print_table(rows, &config.own_id);
                println!("\nYour ranking: {}", board.own_ranking());
            }
        }
        Commands::Search { query } => {
            config.validate_signed_in()?;
            let mut board = load_leaderboard(&data_source(&config)).await?;
            let hits = board.set_search_term(&query);
            if hits.is_empty() {
                println!("No player matches {:?}", query);
            } else {
                print_table(hits, &config.own_id);
            }
        }
        Commands::Play { opponent, yes } => {
            config.validate_signed_in()?;
            let board = load_leaderboard(&data_source(&config)).await?;
            let decision = board.decide_navigation(&opponent);

            match decision {
                Navigation::Blocked => println!("You cannot play against yourself."),
                Navigation::RequiresConfirmation { prior_result } if !yes => {
                    println!(
                        "Already played {} today (result {}). Re-run with --yes to replay.",
                        opponent, prior_result
                    );
                }
                _ => {}
            }
            if let Some(route) = board.confirm(&opponent, decision, yes) {
                println!("{}", route);
            }
        }
        Commands::Rename { name } => {
            config.validate_signed_in()?;
            let source = data_source(&config);
            source.update_display_name(&name).await?;
            let board = load_leaderboard(&source).await?;
            println!(
                "Now playing as {:?}, ranked {}",
                name.trim(),
                board.own_ranking()
            );
        }
        Commands::Import { path } => {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let days: Vec<DayAndGames> = serde_json::from_str(&contents)
                .with_context(|| format!("parsing {}", path.display()))?;
            let storage = StorageConfig::new(config.data_dir.clone());
            let total = merge_games(&storage, days)?;
            println!("Imported; store now holds {} days", total);
        }
        Commands::Prune => {
            config.validate()?;
            let (kept, removed) = data_source(&config).prune()?;
            println!("Removed {} days, kept {}", removed, kept.len());
        }
        Commands::Serve {
            host,
            port,
            refresh_interval,
        } => {
            config.validate_signed_in()?;
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let interval = match refresh_interval.or_else(|| config.server.refresh_interval.clone()) {
                Some(s) => match parse_duration(&s) {
                    Some(d) if !d.is_zero() => Some(d),
                    _ => bail!("Invalid refresh interval: {}", s),
                },
                None => None,
            };

            let state = AppState::new(Arc::new(data_source(&config)));
            if let Err(e) = state.reload().await {
                tracing::warn!("Initial leaderboard load failed: {}", e);
            }

            if let Some(period) = interval {
                let refresher = state.clone();
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(period);
                    ticker.tick().await;
                    loop {
                        ticker.tick().await;
                        if let Err(e) = refresher.reload().await {
                            tracing::warn!("Scheduled refresh failed: {}", e);
                        }
                    }
                });
                tracing::info!("Refreshing leaderboard every {:?}", period);
            }

            let app = build_router(state).layer(cors_layer(&config.server.cors_origin));
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Leaderboard API: http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
