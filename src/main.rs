use anyhow::{Context, Result};
use clap::Parser;
use interview_capture::{create_router, AppState, Config};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "interview-capture", about = "Interview recording and behavioral-metrics capture service")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/interview-capture")]
    config: String,

    /// Override the HTTP port from the configuration file
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;

    let bind = config.service.http.bind.clone();
    let port = args.port.unwrap_or(config.service.http.port);

    info!("{} v{}", config.service.name, env!("CARGO_PKG_VERSION"));
    info!("Analyzer endpoint: {}", config.analyzer.endpoint);

    let state = AppState::new(Arc::new(config));
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind((bind.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", bind, port))?;

    info!("HTTP server listening on {}:{}", bind, port);

    axum::serve(listener, router).await?;

    Ok(())
}
