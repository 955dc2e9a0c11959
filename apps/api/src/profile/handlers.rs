//! Axum route handlers for the job-prep profile.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{ExperienceLevel, ProfileRow, ProfileUpdate};
use crate::progress::handlers::UserIdQuery;
use crate::progress::today;
use crate::state::AppState;

/// Missing fields are stored as empty.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub user_id: Uuid,
    pub target_company: Option<String>,
    pub target_role: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub job_description: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
}

/// GET /api/v1/profile
///
/// Reading the profile counts as a visit for the profile streak.
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProfileRow>, AppError> {
    Ok(Json(
        state.progress.touch_profile(params.user_id, today()).await?,
    ))
}

/// PUT /api/v1/profile
pub async fn handle_save_profile(
    State(state): State<AppState>,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<ProfileRow>, AppError> {
    let update = ProfileUpdate {
        user_id: request.user_id,
        target_company: request.target_company,
        target_role: request.target_role,
        deadline: request.deadline,
        job_description: request.job_description,
        experience_level: request.experience_level,
    };
    Ok(Json(state.progress.save_profile(update).await?))
}
