use axum::extract::{Path, Query, State};
use axum::Json;
use keiko_core::types::Scope;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

// Catalog reads are in-memory lookups; no blocking pool needed.

/// GET /api/catalog: the whole catalog.
pub async fn get_catalog(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!(app.service.catalog()))
}

/// GET /api/catalog/virtues/{id}
pub async fn get_virtue(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let virtue = app.service.catalog().get_virtue(&id)?;
    Ok(Json(serde_json::json!(virtue)))
}

#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
    pub scope: Option<String>,
}

/// GET /api/catalog/challenges?scope=daily|weekly: every challenge when
/// `scope` is omitted.
pub async fn list_challenges(
    State(app): State<AppState>,
    Query(query): Query<ChallengeQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let catalog = app.service.catalog();
    let challenges = match query.scope.as_deref() {
        Some(s) => catalog.list_challenges(s.parse::<Scope>()?),
        None => catalog.challenges.iter().collect(),
    };
    Ok(Json(serde_json::json!(challenges)))
}

/// GET /api/catalog/virtues/{id}/badges
pub async fn list_badges(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let badges = app.service.catalog().list_badges(&id)?;
    Ok(Json(serde_json::json!(badges)))
}

/// GET /api/catalog/trophies
pub async fn list_trophies(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!(app.service.catalog().list_trophies()))
}

/// GET /api/catalog/titles
pub async fn list_titles(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!(app.service.catalog().list_titles()))
}
