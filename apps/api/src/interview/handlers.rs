//! Axum route handlers for mock interviews.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::feedback::extract_feedback_score;
use crate::models::interview::{InterviewRow, InterviewType, NewInterview};
use crate::progress::handlers::UserIdQuery;
use crate::progress::service::InterviewRecorded;
use crate::progress::today;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitInterviewRequest {
    pub user_id: Uuid,
    pub interview_type: InterviewType,
    pub transcript: String,
    pub job_role: String,
}

/// POST /api/v1/interviews
///
/// Grades the transcript, stores the interview and applies it as an activity event.
pub async fn handle_submit_interview(
    State(state): State<AppState>,
    Json(request): Json<SubmitInterviewRequest>,
) -> Result<Json<InterviewRecorded>, AppError> {
    if request.transcript.trim().is_empty() {
        return Err(AppError::Validation("transcript cannot be empty".to_string()));
    }
    if request.job_role.trim().is_empty() {
        return Err(AppError::Validation("job_role cannot be empty".to_string()));
    }

    // Fail fast before spending a model call on an unknown user.
    state.progress.progress(request.user_id).await?;

    let feedback = state
        .feedback
        .generate(&request.transcript, &request.job_role)
        .await;
    let score = extract_feedback_score(&feedback);
    info!(
        "Interview feedback for user {} scored {score}",
        request.user_id
    );

    let recorded = state
        .progress
        .record_interview(
            NewInterview {
                user_id: request.user_id,
                interview_type: request.interview_type,
                transcript: request.transcript,
                ai_feedback_json: feedback,
                score,
            },
            today(),
        )
        .await?;

    Ok(Json(recorded))
}

/// GET /api/v1/interviews?user_id=
pub async fn handle_interview_history(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<InterviewRow>>, AppError> {
    let interviews = state.progress.store().list_interviews(params.user_id).await?;
    Ok(Json(interviews))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
) -> Result<Json<InterviewRow>, AppError> {
    state
        .progress
        .store()
        .find_interview(interview_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))
}
