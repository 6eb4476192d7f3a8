mod config;
mod http_server;
mod logging;
mod ports;
mod services;
mod spotify_rs;
mod youtube_rs;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    config::Config,
    http_server::app::HttpServerConfig,
    logging::{init_tracing, shutdown_tracing},
    services::{
        spotify::client::SpotifyHttpAdapter,
        sync::{SyncOrchestrator, SyncReport},
        youtube::client::YoutubeHttpAdapter,
    },
};

const SERVICE_NAME: &str = "playlist-mirror";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "PLAYLIST_MIRROR_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log filter, a level or an EnvFilter directive (default: info)
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: String,

    /// OTLP gRPC endpoint to export traces to
    #[arg(long, env = "OTLP_ENDPOINT", global = true)]
    otlp_endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mirror YouTube playlists into Spotify once
    Sync {
        /// Print the full run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the HTTP sync trigger
    Serve {
        /// The port to run the server on
        #[arg(short, long, default_value = "3000", env = "PLAYLIST_MIRROR_HTTP_PORT")]
        port: u16,

        /// Also sync periodically, e.g. "6h" or "30m"
        #[arg(
            long,
            value_parser = humantime::parse_duration,
            env = "PLAYLIST_MIRROR_SYNC_INTERVAL"
        )]
        sync_interval: Option<Duration>,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

type Orchestrator = SyncOrchestrator<YoutubeHttpAdapter, SpotifyHttpAdapter>;

fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let youtube_credentials = config.youtube_credentials()?;
    let spotify_credentials = config.spotify_credentials()?;

    let client = reqwest::Client::new();
    let source = YoutubeHttpAdapter::new(
        client.clone(),
        youtube_credentials,
        config.youtube.playlist_prefix.clone(),
        config.request_timeout(),
    );
    let destination = SpotifyHttpAdapter::new(
        client,
        spotify_credentials,
        config.requests_per_second()?,
        config.request_timeout(),
    );

    Ok(SyncOrchestrator::new(source, destination, config.sync_options()?))
}

fn print_summary(report: &SyncReport) {
    for outcome in &report.playlists {
        match &outcome.error {
            Some(error) => println!("✗ {}: {}", outcome.title, error),
            None => println!(
                "✓ {}: {} tracks written, {} not found",
                outcome.title, outcome.tracks_written, outcome.tracks_unresolved
            ),
        }
    }

    if !report.failures.is_empty() {
        println!("\nTracks not found on Spotify:");
        for failure in report.failures.records() {
            println!("  - {} ({})", failure.query, failure.reason);
        }
    }
}

async fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                let path = Config::create_default()?;
                tracing::info!("Default config created at {}", path.display());
            }
            ConfigCommands::Path => match args.config.or_else(Config::config_path) {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
        Commands::Sync { json } => {
            let config = Config::load(args.config.as_deref())
                .wrap_err("Failed to load playlist-mirror config")?;
            let orchestrator = build_orchestrator(&config)?;

            let report = orchestrator.run().await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).wrap_err("Failed to encode report")?
                );
            } else {
                print_summary(&report);
            }
        }
        Commands::Serve {
            port,
            sync_interval,
        } => {
            let config = Config::load(args.config.as_deref())
                .wrap_err("Failed to load playlist-mirror config")?;
            let orchestrator = Arc::new(build_orchestrator(&config)?);

            tracing::info!("Starting HTTP server on port: {}", port);
            http_server::app::start(HttpServerConfig {
                port,
                orchestrator,
                sync_interval,
            })
            .await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let tracer_provider = init_tracing(
        SERVICE_NAME,
        args.otlp_endpoint.as_deref(),
        &args.log_level,
    )?;

    let result = run(args).await;
    shutdown_tracing(tracer_provider);
    result
}
