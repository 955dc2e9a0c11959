use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoadmapRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_title: String,
    pub target_date: Option<NaiveDate>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyTaskRow {
    pub id: Uuid,
    pub roadmap_id: Uuid,
    pub day_number: i32,
    pub content: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

/// A task joined with the owner of its roadmap.
#[derive(Debug, Clone, FromRow)]
pub struct TaskOwnership {
    pub task_id: Uuid,
    pub roadmap_id: Uuid,
    pub user_id: Uuid,
    pub is_completed: bool,
}

/// Per-roadmap task counts used by the roadmap sub-score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RoadmapTally {
    pub roadmap_id: Uuid,
    pub total_tasks: i64,
    pub completed_tasks: i64,
}

/// Insert payload for a plain (non-generated) roadmap.
#[derive(Debug, Clone)]
pub struct NewRoadmap {
    pub user_id: Uuid,
    pub job_title: String,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub roadmap_id: Uuid,
    pub day_number: i32,
    pub content: String,
}
