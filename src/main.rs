// src/main.rs - Arduino Uno simulator server
use arduino_sim::config::{self, Config};
use arduino_sim::simulator::SensorDrift;
use arduino_sim::web::api::{create_router, AppState};
use arduino_sim::ServerError;
use clap::Parser;
use std::path::PathBuf;

/// Arduino Uno simulator server
#[derive(Parser, Debug)]
#[command(name = "arduino-sim", about = "Simulated Arduino Uno served over a WebSocket.")]
struct Cli {
    /// Path to a TOML config file (overrides defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let config = load(&cli).map_err(|e| {
        tracing::error!("Failed to load config: {}", e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;

    tracing::info!("{} Simulator Server starting", config.board.name);
    tracing::info!("Firmware: {}", config.board.firmware);

    if let Err(e) = serve(config).await {
        tracing::error!("Server error: {}", e);
        return Err(Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>);
    }
    tracing::info!("Arduino simulator server stopped");
    Ok(())
}

fn load(cli: &Cli) -> Result<Config, ServerError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            config::load_config(&path.to_string_lossy())?
        }
        None => Config::default(),
    };
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;
    Ok(config)
}

async fn serve(config: Config) -> Result<(), ServerError> {
    let state = AppState::new(config.board.clone());

    let drift = tokio::spawn(SensorDrift::new(&config.drift).run(state.clone()));

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    tracing::info!("Server listening at ws://{}", listener.local_addr()?);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    drift.abort();
    result?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_are_applied() {
        let cli = Cli::parse_from(["arduino-sim", "--host", "0.0.0.0", "--port", "9100"]);
        let config = load(&cli).unwrap();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:9100");
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = Cli::parse_from(["arduino-sim", "--port", "0"]);
        assert!(matches!(load(&cli), Err(ServerError::Config(_))));
    }
}
