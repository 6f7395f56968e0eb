use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use keiko_core::projection::ProgressSnapshot;
use keiko_core::service::CompletionOutcome;
use keiko_core::types::StreakStatus;
use keiko_core::KeikoError;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::{AppState, CompletionNotice};

#[derive(Debug, Deserialize)]
pub struct CompleteBody {
    pub challenge: String,
    /// Dojo-local calendar date; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

fn with_status(
    snapshot: &ProgressSnapshot,
    status: StreakStatus,
) -> Result<serde_json::Value, KeikoError> {
    let mut body = serde_json::to_value(snapshot)?;
    if let Some(obj) = body.as_object_mut() {
        obj.insert("streak_status".into(), serde_json::json!(status));
    }
    Ok(body)
}

/// POST /api/practitioners/{id}/completions: record a completion.
///
/// 200 with `outcome: "completed"`, the snapshot and the diff; 409 with
/// `outcome: "already_completed"`, the unchanged snapshot and `diff: null`
/// when the challenge was already completed this period.
pub async fn complete(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CompleteBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let service = app.service.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        service.complete_challenge(&id, &body.challenge, body.date)
    })
    .await
    .map_err(AppError::join)??;

    let today = app.service.today();
    match outcome {
        CompletionOutcome::Completed {
            event,
            snapshot,
            diff,
        } => {
            // No subscribers is not an error.
            let _ = app
                .event_tx
                .send(CompletionNotice::new(&event, &diff, snapshot.global_xp));
            let snapshot = with_status(&snapshot, snapshot.streak_status(today))?;
            let body = serde_json::json!({
                "outcome": "completed",
                "event": event,
                "snapshot": snapshot,
                "diff": diff,
            });
            Ok((StatusCode::OK, Json(body)))
        }
        CompletionOutcome::AlreadyCompleted { existing, snapshot } => {
            let snapshot = with_status(&snapshot, snapshot.streak_status(today))?;
            let body = serde_json::json!({
                "outcome": "already_completed",
                "error": format!(
                    "'{}' already completed for {}",
                    existing.challenge, existing.period
                ),
                "existing": existing,
                "snapshot": snapshot,
                "diff": null,
            });
            Ok((StatusCode::CONFLICT, Json(body)))
        }
    }
}

/// GET /api/practitioners/{id}/snapshot
pub async fn get_snapshot(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = app.service.clone();
    let result = tokio::task::spawn_blocking(move || {
        let snapshot = service.snapshot(&id)?;
        with_status(&snapshot, snapshot.streak_status(service.today()))
    })
    .await
    .map_err(AppError::join)??;
    Ok(Json(result))
}

/// GET /api/practitioners/{id}/events: the practitioner's completion
/// history, oldest first.
pub async fn list_events(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = app.service.clone();
    let result = tokio::task::spawn_blocking(move || {
        let events = service.history(&id)?;
        Ok::<_, KeikoError>(serde_json::json!(events))
    })
    .await
    .map_err(AppError::join)??;
    Ok(Json(result))
}
