//! Pet Haven API server.
//!
//! Reads configuration from the environment, opens the document store,
//! and serves the REST API.
//!
//! Usage:
//!   cargo run --bin load_data      # seed reference collections
//!   cargo run --bin pet_haven     # start the server
//!
//! Environment:
//!   ACCESS_TOKEN_SECRET  token-signing secret (required)
//!   PORT                 listening port (default 5589)
//!   DATA_DIR             document store location (default pethaven_data)

use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use pet_haven::rest::create_router;
use pet_haven::storage::Storage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Missing signing configuration is fatal at startup, never a
    // per-request error
    let token_secret = env::var("ACCESS_TOKEN_SECRET")
        .map_err(|_| "ACCESS_TOKEN_SECRET must be set")?;
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5589);
    let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "pethaven_data".to_string());

    let storage = Storage::open(&data_dir)?;
    match storage.ping().await {
        Ok(()) => tracing::info!(data_dir = %data_dir, "connected to document store"),
        Err(err) => tracing::error!(error = %err, "document store ping failed"),
    }

    let app = create_router(storage, token_secret);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
