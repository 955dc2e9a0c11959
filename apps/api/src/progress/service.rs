//! Event entry points for the progress engine.
//!
//! Every write for a user runs under that user's lock and inside one store
//! transaction: counters, ledger, streak and the cached score commit together
//! or not at all, one event at a time.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{InterviewRow, NewInterview};
use crate::models::profile::{ProfileRow, ProfileUpdate};
use crate::models::roadmap::{DailyTaskRow, NewRoadmap, NewTask, RoadmapRow};
use crate::progress::calculator;
use crate::progress::ledger::{ActivityLedger, ActivityReport};
use crate::progress::locks::UserLocks;
use crate::progress::scoring::{ScoreResult, ScoringWeights};
use crate::progress::store::{ProgressCounter, ProgressStore, TransactionalStore, UserProgress};
use crate::progress::streak::{StreakState, StreakTransition};
use crate::progress::tracker::{touch_streak, StreakUpdate};

/// What happened to a user's progress as a result of one qualifying event.
#[derive(Debug, Clone, Serialize)]
pub struct EventOutcome {
    pub activity_today: i32,
    pub progress: UserProgress,
    pub streak_transition: StreakTransition,
    pub score: ScoreResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskCompletion {
    pub task_id: Uuid,
    pub roadmap_id: Uuid,
    pub completed: bool,
    /// `false` when the task already had the requested state.
    pub changed: bool,
    /// Present only when the change counted as a new completion event.
    pub event: Option<EventOutcome>,
    pub score: ScoreResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterviewRecorded {
    pub interview: InterviewRow,
    pub event: EventOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoadmapCreated {
    pub roadmap: RoadmapRow,
    pub tasks: Vec<DailyTaskRow>,
    pub score: ScoreResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskAdded {
    pub task: DailyTaskRow,
    pub score: ScoreResult,
}

#[derive(Clone)]
pub struct ProgressService {
    store: Arc<dyn ProgressStore>,
    transactions: Arc<dyn TransactionalStore>,
    locks: UserLocks,
    weights: ScoringWeights,
}

impl ProgressService {
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: ProgressStore + TransactionalStore + 'static,
    {
        Self {
            store: store.clone(),
            transactions: store,
            locks: UserLocks::new(),
            weights: ScoringWeights::default(),
        }
    }

    pub fn store(&self) -> &dyn ProgressStore {
        self.store.as_ref()
    }

    pub fn ledger(&self) -> ActivityLedger<'_> {
        ActivityLedger::new(self.store.as_ref())
    }

    pub async fn progress(&self, user_id: Uuid) -> Result<UserProgress, AppError> {
        self.store
            .load_progress(user_id)
            .await?
            .ok_or_else(|| AppError::user_not_found(user_id))
    }

    /// Evaluates the ledger-driven streak for `today`.
    pub async fn touch(&self, user_id: Uuid, today: NaiveDate) -> Result<StreakUpdate, AppError> {
        let _guard = self.locks.acquire(user_id).await;
        let tx = self.transactions.begin().await?;
        let progress = lock_user(tx.store(), user_id).await?;
        let update = touch_streak(tx.store(), progress, today).await?;
        tx.commit().await?;
        Ok(update)
    }

    pub async fn calculate(&self, user_id: Uuid) -> Result<ScoreResult, AppError> {
        calculator::calculate(self.store.as_ref(), user_id, &self.weights).await
    }

    pub async fn persist_score(&self, user_id: Uuid) -> Result<ScoreResult, AppError> {
        let _guard = self.locks.acquire(user_id).await;
        let tx = self.transactions.begin().await?;
        lock_user(tx.store(), user_id).await?;
        let result = calculator::persist_score(tx.store(), user_id, &self.weights).await?;
        tx.commit().await?;
        Ok(result)
    }

    pub async fn activity_report(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        window_days: u32,
    ) -> Result<ActivityReport, AppError> {
        self.progress(user_id).await?;
        self.ledger().report(user_id, today, window_days).await
    }

    /// Marks a task complete or incomplete on behalf of its owner.
    ///
    /// Only an incomplete → complete flip counts as an activity event. Any flip
    /// refreshes the cached score.
    pub async fn complete_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        completed: bool,
        today: NaiveDate,
    ) -> Result<TaskCompletion, AppError> {
        let _guard = self.locks.acquire(user_id).await;
        let tx = self.transactions.begin().await?;
        let store = tx.store();
        lock_user(store, user_id).await?;

        let task = store
            .find_task(task_id)
            .await?
            .filter(|t| t.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Task {task_id} not found")))?;

        if task.is_completed == completed {
            debug!("Task {task_id} already has completed={completed}");
            let score = calculator::calculate(store, user_id, &self.weights).await?;
            return Ok(TaskCompletion {
                task_id,
                roadmap_id: task.roadmap_id,
                completed,
                changed: false,
                event: None,
                score,
            });
        }

        let changed = store.set_task_completed(task_id, completed).await?;
        debug!("Task {task_id} completed={completed} changed={changed}");

        let (event, score) = if changed && completed {
            let event = self
                .apply_event(store, user_id, ProgressCounter::TasksCompleted, today)
                .await?;
            let score = event.score.clone();
            (Some(event), score)
        } else if changed {
            let score = calculator::persist_score(store, user_id, &self.weights).await?;
            (None, score)
        } else {
            let score = calculator::calculate(store, user_id, &self.weights).await?;
            (None, score)
        };

        tx.commit().await?;
        Ok(TaskCompletion {
            task_id,
            roadmap_id: task.roadmap_id,
            completed,
            changed,
            event,
            score,
        })
    }

    /// Stores a scored interview and applies it as an activity event.
    pub async fn record_interview(
        &self,
        interview: NewInterview,
        today: NaiveDate,
    ) -> Result<InterviewRecorded, AppError> {
        let user_id = interview.user_id;
        let _guard = self.locks.acquire(user_id).await;
        let tx = self.transactions.begin().await?;
        let store = tx.store();
        lock_user(store, user_id).await?;

        let interview = store.insert_interview(interview).await?;
        let event = self
            .apply_event(store, user_id, ProgressCounter::InterviewsCompleted, today)
            .await?;

        tx.commit().await?;
        info!(
            "Recorded {} interview {} for user {user_id} (score {:?})",
            interview.interview_type, interview.id, interview.score
        );
        Ok(InterviewRecorded { interview, event })
    }

    /// Creates a roadmap, optionally with its tasks numbered from day 1.
    pub async fn create_roadmap(
        &self,
        roadmap: NewRoadmap,
        task_contents: Vec<String>,
    ) -> Result<RoadmapCreated, AppError> {
        if roadmap.job_title.trim().is_empty() {
            return Err(AppError::Validation("job_title cannot be empty".to_string()));
        }
        if task_contents.iter().any(|c| c.trim().is_empty()) {
            return Err(AppError::Validation("task content cannot be empty".to_string()));
        }

        let user_id = roadmap.user_id;
        let _guard = self.locks.acquire(user_id).await;
        let tx = self.transactions.begin().await?;
        let store = tx.store();
        lock_user(store, user_id).await?;

        let roadmap = store.insert_roadmap(roadmap).await?;
        let mut tasks = Vec::with_capacity(task_contents.len());
        for (day, content) in (1..).zip(task_contents) {
            let task = NewTask {
                roadmap_id: roadmap.id,
                day_number: day,
                content,
            };
            tasks.push(store.insert_task(task).await?);
        }
        let score = calculator::persist_score(store, user_id, &self.weights).await?;

        tx.commit().await?;
        info!(
            "Created roadmap {} with {} tasks for user {user_id}",
            roadmap.id,
            tasks.len()
        );
        Ok(RoadmapCreated {
            roadmap,
            tasks,
            score,
        })
    }

    /// Appends a task to one of the user's roadmaps. Without a day number the
    /// task goes after the current last day.
    pub async fn add_task(
        &self,
        user_id: Uuid,
        roadmap_id: Uuid,
        content: String,
        day_number: Option<i32>,
    ) -> Result<TaskAdded, AppError> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("content cannot be empty".to_string()));
        }
        if matches!(day_number, Some(day) if day < 1) {
            return Err(AppError::Validation("day_number must be at least 1".to_string()));
        }

        let _guard = self.locks.acquire(user_id).await;
        let tx = self.transactions.begin().await?;
        let store = tx.store();
        lock_user(store, user_id).await?;

        let roadmap = owned_roadmap(store, user_id, roadmap_id).await?;
        let day_number = match day_number {
            Some(day) => day,
            None => {
                let tasks = store.list_tasks(roadmap.id).await?;
                tasks.iter().map(|t| t.day_number).max().unwrap_or(0) + 1
            }
        };
        let task = store
            .insert_task(NewTask {
                roadmap_id: roadmap.id,
                day_number,
                content,
            })
            .await?;
        let score = calculator::persist_score(store, user_id, &self.weights).await?;

        tx.commit().await?;
        Ok(TaskAdded { task, score })
    }

    pub async fn roadmaps(&self, user_id: Uuid) -> Result<Vec<RoadmapRow>, AppError> {
        self.progress(user_id).await?;
        self.store.list_roadmaps(user_id).await
    }

    pub async fn roadmap(&self, user_id: Uuid, roadmap_id: Uuid) -> Result<RoadmapRow, AppError> {
        owned_roadmap(self.store.as_ref(), user_id, roadmap_id).await
    }

    /// Creates or updates the editable profile fields. The profile streak is untouched.
    pub async fn save_profile(&self, update: ProfileUpdate) -> Result<ProfileRow, AppError> {
        let user_id = update.user_id;
        let _guard = self.locks.acquire(user_id).await;
        let tx = self.transactions.begin().await?;
        lock_user(tx.store(), user_id).await?;
        let profile = tx.store().upsert_profile(update).await?;
        tx.commit().await?;
        Ok(profile)
    }

    /// Reads the profile and advances its access streak.
    pub async fn touch_profile(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<ProfileRow, AppError> {
        let _guard = self.locks.acquire(user_id).await;
        let tx = self.transactions.begin().await?;
        let store = tx.store();
        lock_user(store, user_id).await?;

        let mut profile = store
            .load_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile not found for user {user_id}")))?;

        let state = StreakState::from_stored(profile.current_streak, profile.last_activity_date);
        let (next, transition) = state.advance_by_last_active(today);
        if transition != StreakTransition::Unchanged {
            store.save_profile_streak(profile.id, &next).await?;
            tx.commit().await?;
            debug!(
                "Profile streak for user {user_id}: {:?} {} -> {}",
                transition, state.current, next.current
            );
            profile.current_streak = next.stored_current();
            profile.last_activity_date = next.last_active;
        }
        Ok(profile)
    }

    /// Counter, ledger, streak, score. Caller holds the user's lock and `store`
    /// is the event's transaction.
    async fn apply_event(
        &self,
        store: &dyn ProgressStore,
        user_id: Uuid,
        counter: ProgressCounter,
        today: NaiveDate,
    ) -> Result<EventOutcome, AppError> {
        store.bump_counter(user_id, counter).await?;
        let activity_today = ActivityLedger::new(store)
            .record_activity(user_id, today)
            .await?;

        let progress = store
            .load_progress(user_id)
            .await?
            .ok_or_else(|| AppError::user_not_found(user_id))?;
        let streak = touch_streak(store, progress, today).await?;

        let score = calculator::persist_score(store, user_id, &self.weights).await?;

        Ok(EventOutcome {
            activity_today,
            progress: UserProgress {
                crack_score: score.score,
                ..streak.progress
            },
            streak_transition: streak.transition,
            score,
        })
    }
}

/// Loads the user and, inside a transaction, holds their row until it ends.
async fn lock_user(store: &dyn ProgressStore, user_id: Uuid) -> Result<UserProgress, AppError> {
    store
        .lock_progress(user_id)
        .await?
        .ok_or_else(|| AppError::user_not_found(user_id))
}

/// Another user's roadmap is reported as missing.
async fn owned_roadmap(
    store: &dyn ProgressStore,
    user_id: Uuid,
    roadmap_id: Uuid,
) -> Result<RoadmapRow, AppError> {
    store
        .find_roadmap(roadmap_id)
        .await?
        .filter(|r| r.user_id == user_id)
        .ok_or_else(|| AppError::NotFound(format!("Roadmap {roadmap_id} not found")))
}
