//! Search service for a multi-role marketplace (administrators, entrepreneurs, customers).
//!
//! Accounts, messaging, complaints, favorites and catalog CRUD live in other
//! services. This crate only reads their MongoDB collections and answers search
//! and autocomplete requests.
//!
//!
//!
//! # General Infrastructure
//! - Stateless HTTP service behind the marketplace gateway, all routes public `GET`
//! - One MongoDB client per process, shared by every request
//! - No cache: every response is computed from current data
//!
//!
//!
//! # Routes
//!
//! | Route | Params | Response |
//! |---|---|---|
//! | `/search` | `q`, `types`, `page`, `limit`, `mode` | `{q, page, limit, results, counts}` |
//! | `/search/suggest` | `q` | `{q, sugerencias}` |
//! | `/productos/search` | `q`, `page`, `limit`, `mode` | `{q, page, limit, results, total}` |
//! | `/emprendimientos/search` | same | same |
//! | `/emprendedores/search` | same | same |
//! | `/health` | | `{status}` |
//!
//! A missing or blank `q` is a `400` and never reaches the database. Store
//! failures are logged and returned as a bare `500`.
//!
//!
//!
//! # Notes
//!
//! ## Why joins instead of denormalized names
//! Venture and vendor names change through the CRUD services without touching
//! products. Joining at query time keeps `ventureName`/`ownerName` correct with
//! no sync job, at the cost of running the join for both the page and the count.
//!
//! ## Why fail the whole search
//! The unified response has no way to say "this section failed". An empty list
//! has to mean "no matches", so any failing section fails the request.
//!
//!
//!
//! # Setup
//!
//! Run against a local MongoDB.
//! ```sh
//! MONGO_URI=mongodb://localhost:27017 RUST_LOG=info cargo run
//! ```
//!
//! Generate docs in `target/doc/marketplace_search/index.html`.
//! ```sh
//! cargo doc
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
    routing::get,
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod pattern;
pub mod query;
pub mod routes;
pub mod search;
pub mod state;

use error::StartupError;
use routes::{
    health_handler, products_handler, search_handler, suggest_handler, vendors_handler,
    ventures_handler,
};
use state::State;

pub async fn start_server() -> Result<(), StartupError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await?;

    info!("Starting server...");
    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

pub fn build_router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.config.cors_allowed_origins))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health_handler))
        .route("/search", get(search_handler))
        .route("/search/suggest", get(suggest_handler))
        .route("/productos/search", get(products_handler))
        .route("/emprendimientos/search", get(ventures_handler))
        .route("/emprendedores/search", get(vendors_handler))
        .layer(cors)
        .with_state(state)
}

fn allowed_origins(origins: &[String]) -> AllowOrigin {
    if origins.is_empty() {
        return AllowOrigin::any();
    }

    AllowOrigin::list(
        origins
            .iter()
            .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
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
                std::future::pending::<()>().await;
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
