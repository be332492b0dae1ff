//! Address lookup companion for the happy hour map.
//!
//! The sheet stores shortened map links. Browsers cannot follow those across
//! origins, so the page asks this service instead.
//!
//!
//!
//! # Endpoint
//! `GET /api/resolve-google-link?url=<short link>&name=<restaurant>`
//!
//! - `200 {"address", "url"}` when the restaurant is in the known address table
//! - `400 {"error"}` when `url` or `name` is missing
//! - `404 {"error", "resolvedUrl"}` when no address is known
//! - `500 {"error", "details"}` when following the link fails
//!
//!
//!
//! # Setup
//!
//! Run with defaults (port 3000, origin `http://127.0.0.1:5500`).
//! ```sh
//! RUST_LOG=info cargo run -p backend
//! ```
//!
//! Override.
//! ```sh
//! RUST_PORT=8080 CLIENT_ORIGIN=http://localhost:5173 cargo run -p backend
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod lookup;
pub mod routes;
pub mod state;

use config::Config;
use routes::resolve_handler;
use state::State;

pub const RESOLVE_PATH: &str = "/api/resolve-google-link";

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new(Config::load()?);

    info!("Starting server...");
    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Address lookup listening at http://localhost:{}", state.config.port);
    info!("CORS enabled for client origin: {:?}", state.config.client_origin);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    Ok(())
}

pub fn router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.client_origin.clone())
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route(RESOLVE_PATH, get(resolve_handler))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            return std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
