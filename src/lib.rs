pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod services;

use std::path::Path;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use db::Store;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::Migrate { dir } => run_migrate(config, dir).await,
        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("Created config.toml");
            } else {
                println!("config.toml already exists");
            }
            Ok(())
        }
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("Recruitr v{} starting...", env!("CARGO_PKG_VERSION"));

    let state = api::create_app_state_from_config(config.clone()).await?;
    let app = api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server running at http://{}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }

    server_handle.abort();
    info!("Server stopped");

    Ok(())
}

/// Deploy-time entry point: bring the schema up to date and exit. A fatal
/// migration error propagates out of here as a non-zero process exit.
async fn run_migrate(config: Config, dir: Option<String>) -> anyhow::Result<()> {
    let dir = dir.unwrap_or_else(|| config.general.migrations_dir.clone());

    let store = Store::new(&config.general.database_path, Path::new(&dir)).await?;
    store.ping().await?;

    Ok(())
}
