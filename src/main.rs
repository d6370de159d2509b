use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use llm_task_engine::{
    run_server, utils::setup_logging, AppState, Features, ServerConfig, TaskEngine, VERSION,
};

/// Text-to-SQL and summarization server for fine-tuned FLAN-T5 models
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML config file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    setup_logging(&config.logging).context("Failed to setup logging")?;
    info!(version = VERSION, features = %Features::detect(), "Starting llm-task-server");

    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_address))?;

    let http = config.server.clone();
    let engine = TaskEngine::builder()
        .with_config(config)
        .build()
        .await
        .context("Failed to load task models")?;

    run_server(AppState::new(engine, http), addr)
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}
