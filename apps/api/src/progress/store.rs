//! Persistence seam for the progress engine.
//!
//! `ProgressService` reads through a shared `ProgressStore` and performs every
//! write inside a [`ProgressTx`] opened from the same backend, so one triggering
//! event commits or rolls back as a unit. Production wires in
//! [`PgProgressStore`](crate::progress::pg::PgProgressStore), tests use the
//! in-memory store.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::activity::ActivityRow;
use crate::models::interview::{InterviewRow, NewInterview};
use crate::models::profile::{ProfileRow, ProfileUpdate};
use crate::models::roadmap::{DailyTaskRow, NewRoadmap, NewTask, RoadmapRow, TaskOwnership};
use crate::models::user::UserRow;
use crate::progress::scoring::ScoreHistory;
use crate::progress::streak::StreakState;

/// Explicit per-user progress state threaded through the tracker and calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProgress {
    pub user_id: Uuid,
    pub crack_score: i32,
    pub streak: StreakState,
    pub tasks_completed: i32,
    pub interviews_completed: i32,
}

impl From<UserRow> for UserProgress {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.id,
            crack_score: row.crack_score,
            streak: StreakState::from_stored(row.day_streak, row.last_streak_date),
            tasks_completed: row.tasks_completed,
            interviews_completed: row.interviews_completed,
        }
    }
}

/// Lifetime counters on the user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressCounter {
    TasksCompleted,
    InterviewsCompleted,
}

impl ProgressCounter {
    pub fn column(&self) -> &'static str {
        match self {
            ProgressCounter::TasksCompleted => "tasks_completed",
            ProgressCounter::InterviewsCompleted => "interviews_completed",
        }
    }
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn load_progress(&self, user_id: Uuid) -> Result<Option<UserProgress>, AppError>;

    /// Same as `load_progress`, but inside a transaction the user's row stays
    /// locked until commit.
    async fn lock_progress(&self, user_id: Uuid) -> Result<Option<UserProgress>, AppError>;

    /// Writes the streak unless it was already evaluated for `streak.last_active`.
    /// Returns `false` when another writer got there first.
    async fn save_streak(&self, user_id: Uuid, streak: &StreakState) -> Result<bool, AppError>;

    async fn save_crack_score(&self, user_id: Uuid, score: i32) -> Result<(), AppError>;

    async fn bump_counter(&self, user_id: Uuid, counter: ProgressCounter) -> Result<(), AppError>;

    /// Adds one event to the (user, date) ledger row, creating it at 1. Returns the new count.
    async fn increment_activity(&self, user_id: Uuid, date: NaiveDate) -> Result<i32, AppError>;

    async fn activity_count(&self, user_id: Uuid, date: NaiveDate)
        -> Result<Option<i32>, AppError>;

    /// Ledger rows on or after `since`, oldest first.
    async fn activity_since(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<ActivityRow>, AppError>;

    /// Roadmap tallies and interview scores read from one consistent snapshot.
    async fn score_history(&self, user_id: Uuid) -> Result<ScoreHistory, AppError>;

    async fn insert_roadmap(&self, roadmap: NewRoadmap) -> Result<RoadmapRow, AppError>;

    async fn find_roadmap(&self, roadmap_id: Uuid) -> Result<Option<RoadmapRow>, AppError>;

    /// Oldest first.
    async fn list_roadmaps(&self, user_id: Uuid) -> Result<Vec<RoadmapRow>, AppError>;

    async fn insert_task(&self, task: NewTask) -> Result<DailyTaskRow, AppError>;

    async fn list_tasks(&self, roadmap_id: Uuid) -> Result<Vec<DailyTaskRow>, AppError>;

    async fn find_task(&self, task_id: Uuid) -> Result<Option<TaskOwnership>, AppError>;

    /// Flips completion. Returns `false` when the task already had that value.
    async fn set_task_completed(&self, task_id: Uuid, completed: bool) -> Result<bool, AppError>;

    async fn insert_interview(&self, interview: NewInterview) -> Result<InterviewRow, AppError>;

    async fn find_interview(&self, interview_id: Uuid) -> Result<Option<InterviewRow>, AppError>;

    /// Newest first.
    async fn list_interviews(&self, user_id: Uuid) -> Result<Vec<InterviewRow>, AppError>;

    async fn load_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>, AppError>;

    /// Creates the profile or overwrites its editable fields, keeping the streak.
    async fn upsert_profile(&self, update: ProfileUpdate) -> Result<ProfileRow, AppError>;

    async fn save_profile_streak(
        &self,
        profile_id: Uuid,
        streak: &StreakState,
    ) -> Result<(), AppError>;
}

/// A backend that can open write transactions.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn ProgressTx>, AppError>;
}

/// An open write transaction. Dropping it without `commit` discards every write.
#[async_trait]
pub trait ProgressTx: Send + Sync {
    /// Reads and writes scoped to this transaction.
    fn store(&self) -> &dyn ProgressStore;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
