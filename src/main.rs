use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use deepcut::cache::LibraryCache;
use deepcut::config::AppConfig;
use deepcut::engine::{self, AnalysisOptions};
use deepcut::horizon::parse_horizon;
use deepcut::library::ingest::build_index;
use deepcut::render;
use deepcut::spotify::{SpotifyClient, normalize_user_id};

#[derive(Parser)]
#[command(name = "deepcut", version, about = "Playlist library analyzer — find the tracks you actually love")]
struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a user's public playlists and rank their tracks
    Analyze {
        /// Spotify user ID or profile URL
        user_id: String,

        /// Number of entries per ranked list
        #[arg(short = 'n', long, default_value = "50")]
        top: usize,

        /// Only consider tracks added within this window (e.g. 1y, 6m, 30d)
        #[arg(long)]
        horizon: Option<String>,

        /// Write the full report as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the cache entirely (don't read or write it)
        #[arg(long)]
        no_cache: bool,

        /// Refetch even if a fresh cached snapshot exists
        #[arg(long)]
        refresh_cache: bool,
    },

    /// Remove cached library snapshots
    ClearCache {
        /// Only clear this user's snapshot (default: all)
        user_id: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = AppConfig::load();

    match cli.command {
        Commands::Analyze {
            user_id,
            top,
            horizon,
            output,
            no_cache,
            refresh_cache,
        } => {
            let now = Utc::now();

            // Reject bad knobs before any network traffic.
            if top == 0 {
                anyhow::bail!("--top must be a positive integer");
            }
            if let Some(spec) = horizon.as_deref() {
                parse_horizon(spec, now)?;
            }

            let user_id = normalize_user_id(&user_id);
            let cache = LibraryCache::open(config.cache_ttl_hours);

            let raw = if no_cache || refresh_cache {
                None
            } else {
                cache.load(&user_id, now)
            };
            let raw = match raw {
                Some(raw) => raw,
                None => {
                    let (client_id, client_secret) = config.credentials()?;
                    let client = SpotifyClient::connect(&client_id, &client_secret)
                        .context("Spotify authentication failed")?;
                    let raw = client
                        .fetch_library(&user_id)
                        .with_context(|| format!("Failed to fetch library for {user_id}"))?;
                    if !no_cache {
                        if let Err(e) = cache.save(&user_id, &raw, now) {
                            log::warn!("Failed to cache library: {e:#}");
                        }
                    }
                    raw
                }
            };

            let (index, playlists, _stats) = build_index(&raw, &user_id);

            let opts = AnalysisOptions {
                top_n: top,
                horizon,
                weights: config.weights.clone(),
                now,
            };
            let report = engine::analyze(raw.user.clone(), &index, &playlists, &opts)
                .context("Analysis failed")?;

            render::print_report(&report);

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&report)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!();
                println!("Report written to {}", path.display());
            }
        }

        Commands::ClearCache { user_id } => {
            let cache = LibraryCache::open(config.cache_ttl_hours);
            let user_id = user_id.as_deref().map(normalize_user_id);
            let removed = cache
                .clear(user_id.as_deref())
                .context("Failed to clear cache")?;
            println!("Removed {removed} cached snapshot(s)");
        }
    }

    Ok(())
}
