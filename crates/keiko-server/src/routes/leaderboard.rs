use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

/// GET /api/leaderboard?limit=N: practitioners ranked by total XP.
pub async fn get_leaderboard(
    State(app): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let service = app.service.clone();
    let result = tokio::task::spawn_blocking(move || {
        let entries = service.leaderboard(limit)?;
        Ok::<_, keiko_core::KeikoError>(serde_json::json!({ "entries": entries }))
    })
    .await
    .map_err(AppError::join)??;
    Ok(Json(result))
}
