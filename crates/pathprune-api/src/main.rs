#![forbid(unsafe_code)]

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let host = std::env::var("PATHPRUNE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PATHPRUNE_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{host}:{port}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            return;
        }
    };
    info!("listening on {addr}");

    if let Err(err) = axum::serve(listener, pathprune_api::app()).await {
        error!("server error: {err}");
    }
}
