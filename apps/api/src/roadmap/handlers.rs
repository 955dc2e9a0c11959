//! Axum route handlers for roadmaps and daily tasks.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::roadmap::{DailyTaskRow, NewRoadmap, RoadmapRow};
use crate::progress::handlers::UserIdQuery;
use crate::progress::service::{RoadmapCreated, TaskAdded, TaskCompletion};
use crate::progress::today;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRoadmapRequest {
    pub user_id: Uuid,
    pub job_title: String,
    pub target_date: Option<NaiveDate>,
    /// Task contents for day 1, 2, ... in order.
    #[serde(default)]
    pub tasks: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub user_id: Uuid,
    pub content: String,
    pub day_number: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteTaskRequest {
    pub user_id: Uuid,
    pub completed: bool,
}

/// POST /api/v1/roadmaps
pub async fn handle_create_roadmap(
    State(state): State<AppState>,
    Json(request): Json<CreateRoadmapRequest>,
) -> Result<Json<RoadmapCreated>, AppError> {
    let roadmap = NewRoadmap {
        user_id: request.user_id,
        job_title: request.job_title,
        target_date: request.target_date,
    };
    let created = state.progress.create_roadmap(roadmap, request.tasks).await?;
    Ok(Json(created))
}

/// GET /api/v1/roadmaps?user_id=
pub async fn handle_list_roadmaps(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<RoadmapRow>>, AppError> {
    Ok(Json(state.progress.roadmaps(params.user_id).await?))
}

/// GET /api/v1/roadmaps/:id?user_id=
pub async fn handle_get_roadmap(
    State(state): State<AppState>,
    Path(roadmap_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<RoadmapRow>, AppError> {
    Ok(Json(state.progress.roadmap(params.user_id, roadmap_id).await?))
}

/// GET /api/v1/roadmaps/:id/tasks
pub async fn handle_list_tasks(
    State(state): State<AppState>,
    Path(roadmap_id): Path<Uuid>,
) -> Result<Json<Vec<DailyTaskRow>>, AppError> {
    let store = state.progress.store();
    if store.find_roadmap(roadmap_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Roadmap {roadmap_id} not found")));
    }
    Ok(Json(store.list_tasks(roadmap_id).await?))
}

/// POST /api/v1/roadmaps/:id/tasks
pub async fn handle_create_task(
    State(state): State<AppState>,
    Path(roadmap_id): Path<Uuid>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<Json<TaskAdded>, AppError> {
    let added = state
        .progress
        .add_task(
            request.user_id,
            roadmap_id,
            request.content,
            request.day_number,
        )
        .await?;
    Ok(Json(added))
}

/// PATCH /api/v1/tasks/:id/complete
pub async fn handle_complete_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(request): Json<CompleteTaskRequest>,
) -> Result<Json<TaskCompletion>, AppError> {
    let outcome = state
        .progress
        .complete_task(request.user_id, task_id, request.completed, today())
        .await?;
    Ok(Json(outcome))
}
