//! Ephemeral Chat-Room Server - Entry Point
//!
//! Builds the room store, starts the expiry reaper, and accepts
//! WebSocket connections.

use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tempchat::{handle_connection, spawn_reaper, RoomStore, DEFAULT_SWEEP_INTERVAL};

/// Default server address
const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=tempchat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tempchat=info")),
        )
        .init();

    // Get bind address from command line or use default
    let addr = env::args().nth(1).unwrap_or_else(|| DEFAULT_ADDR.to_string());

    // Start TCP listener
    let listener = TcpListener::bind(&addr).await?;
    info!("Chat server listening on {}", addr);

    // Construct the store once and inject it everywhere
    let store = Arc::new(RoomStore::new());
    spawn_reaper(Arc::clone(&store), DEFAULT_SWEEP_INTERVAL);
    info!("Expiry reaper started");

    // Connection accept loop
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let store = Arc::clone(&store);

                // Spawn handler task for each connection
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, store).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
