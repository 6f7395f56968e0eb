pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health::health))
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Catalog
        .route("/api/catalog", get(routes::catalog::get_catalog))
        .route(
            "/api/catalog/virtues/{id}",
            get(routes::catalog::get_virtue),
        )
        .route(
            "/api/catalog/virtues/{id}/badges",
            get(routes::catalog::list_badges),
        )
        .route(
            "/api/catalog/challenges",
            get(routes::catalog::list_challenges),
        )
        .route("/api/catalog/trophies", get(routes::catalog::list_trophies))
        .route("/api/catalog/titles", get(routes::catalog::list_titles))
        // Practitioners
        .route(
            "/api/practitioners/{id}/completions",
            post(routes::practitioners::complete),
        )
        .route(
            "/api/practitioners/{id}/snapshot",
            get(routes::practitioners::get_snapshot),
        )
        .route(
            "/api/practitioners/{id}/events",
            get(routes::practitioners::list_events),
        )
        // Reporting
        .route(
            "/api/leaderboard",
            get(routes::leaderboard::get_leaderboard),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the keiko API server for the data directory at `root`.
pub async fn serve(root: PathBuf, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(root, listener).await
}

/// Start the keiko API server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(root: PathBuf, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app_state = state::AppState::load(&root)?;
    let app = build_router(app_state);

    tracing::info!("keiko API listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
