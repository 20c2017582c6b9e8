//! Switchboard - Main Entry Point
//!
//! Loads the TOML configuration, builds the dispatcher, and either serves
//! HTTP or answers a single request from the command line.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use switchboard::bootstrap::build_dispatcher;
use switchboard::config::AppConfig;
use switchboard::observability::init_default_logging;
use switchboard::server;
use tokio::signal;
use tracing::{error, info};

/// Route free-text requests to agents
#[derive(Parser)]
#[command(name = "switchboard")]
#[command(about = "Routes free-text requests to the agent best suited to answer them")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "SWITCHBOARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve,
    /// Dispatch one request and print the response as JSON
    Ask {
        /// Request text
        text: String,
    },
    /// List agent descriptions
    Agents,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting switchboard v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => run_server(config).await,
        Commands::Ask { text } => ask(config, text).await,
        Commands::Agents => list_agents(config),
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<AppConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(AppConfig::load_from_file(path)?)
        }
        None => {
            // Try default locations
            let default_paths = ["switchboard.toml", "config/switchboard.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(AppConfig::load_from_file(&path)?);
                }
            }

            Err(
                "No configuration file found. Provide one with -c/--config or create switchboard.toml"
                    .into(),
            )
        }
    }
}

async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.socket_addr()?;
    let dispatcher = Arc::new(build_dispatcher(&config)?);

    server::serve(dispatcher, addr, shutdown_signal()).await?;

    info!("Application shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down gracefully..."),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully..."),
    }
}

async fn ask(config: AppConfig, text: String) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = build_dispatcher(&config)?;
    let response = dispatcher.dispatch_text(text).await;
    println!("{}", serde_json::to_string_pretty(&response.body())?);
    Ok(())
}

fn list_agents(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = build_dispatcher(&config)?;
    for description in dispatcher.list_agents() {
        println!("{}: {}", description.name, description.summary);
        println!("  e.g. \"{}\"", description.example);
    }
    Ok(())
}

fn handle_config_command(config: AppConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("{}", toml::to_string_pretty(&config)?);
    } else {
        println!("Configuration is valid");
        println!("Agents: {}", config.agents.len());
        match &config.routing {
            Some(routing) => println!("Routing chain: {} router(s)", routing.chain.len()),
            None => println!("Routing chain: not configured"),
        }
        println!("Listen address: {}", config.bind_address());
    }
    Ok(())
}
