//! Axum route handlers for scores, streaks and activity.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::MAX_ACTIVITY_WINDOW_DAYS;
use crate::errors::AppError;
use crate::progress::ledger::ActivityReport;
use crate::progress::scoring::ScoreResult;
use crate::progress::store::UserProgress;
use crate::progress::today;
use crate::progress::tracker::StreakUpdate;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UserIdBody {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub user_id: Uuid,
    pub days: Option<u32>,
}

// ────────────────────────────────────────────────────────────────────────────
// Progress & score
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/progress
///
/// Cached counters, streak and crack score as last stored.
pub async fn handle_get_progress(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<UserProgress>, AppError> {
    Ok(Json(state.progress.progress(params.user_id).await?))
}

/// GET /api/v1/progress/score
///
/// Recomputes from history without touching the cached value.
pub async fn handle_get_score(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ScoreResult>, AppError> {
    Ok(Json(state.progress.calculate(params.user_id).await?))
}

/// POST /api/v1/progress/score/refresh
pub async fn handle_refresh_score(
    State(state): State<AppState>,
    Json(body): Json<UserIdBody>,
) -> Result<Json<ScoreResult>, AppError> {
    Ok(Json(state.progress.persist_score(body.user_id).await?))
}

/// GET /api/v1/progress/activity
pub async fn handle_activity(
    State(state): State<AppState>,
    Query(params): Query<ActivityQuery>,
) -> Result<Json<ActivityReport>, AppError> {
    let days = params.days.unwrap_or(state.config.activity_window_days);
    if days == 0 || days > MAX_ACTIVITY_WINDOW_DAYS {
        return Err(AppError::Validation(format!(
            "days must be between 1 and {MAX_ACTIVITY_WINDOW_DAYS}"
        )));
    }
    let report = state
        .progress
        .activity_report(params.user_id, today(), days)
        .await?;
    Ok(Json(report))
}

/// POST /api/v1/progress/touch
pub async fn handle_touch(
    State(state): State<AppState>,
    Json(body): Json<UserIdBody>,
) -> Result<Json<StreakUpdate>, AppError> {
    Ok(Json(state.progress.touch(body.user_id, today()).await?))
}
