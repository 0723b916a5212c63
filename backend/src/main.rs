//! Deep Thoughts API server.

use std::env;
use std::sync::Arc;

use deep_thoughts_backend::{app, logging, AppState, Config};
use tokio::net::TcpListener;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("deep-thoughts {}", VERSION);
        return Ok(());
    }

    // Load configuration
    let config = Config::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Make sure config.toml exists or set THOUGHTS__AUTH__SECRET.",
            e
        )
    })?;

    logging::init(&config.logging.level);

    tracing::info!("Starting Deep Thoughts API server");
    tracing::debug!(?config, "Loaded configuration");

    let state = Arc::new(AppState::new(config.clone())?);
    let router = app(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("API server running on {}", addr);
    tracing::info!("Use the API at http://{}/api", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
