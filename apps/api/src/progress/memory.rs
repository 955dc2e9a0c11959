//! In-memory `ProgressStore` for tests, with seeding helpers.
//!
//! A transaction works on a private copy of the tables and swaps it in on
//! commit. Transactions run one at a time; writes made directly on the store
//! while one is open are lost when it commits.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::activity::ActivityRow;
use crate::models::interview::{InterviewRow, NewInterview};
use crate::models::profile::{ProfileRow, ProfileUpdate};
use crate::models::roadmap::{
    DailyTaskRow, NewRoadmap, NewTask, RoadmapRow, RoadmapTally, TaskOwnership,
};
use crate::progress::scoring::ScoreHistory;
use crate::progress::store::{
    ProgressCounter, ProgressStore, ProgressTx, TransactionalStore, UserProgress,
};
use crate::progress::streak::StreakState;

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<Uuid, UserProgress>,
    activities: BTreeMap<(Uuid, NaiveDate), i32>,
    roadmaps: Vec<RoadmapRow>,
    tasks: Vec<DailyTaskRow>,
    interviews: Vec<InterviewRow>,
    profiles: Vec<ProfileRow>,
}

#[derive(Clone, Default)]
pub struct InMemoryProgressStore {
    tables: Arc<Mutex<Tables>>,
    tx_gate: Arc<AsyncMutex<()>>,
    fail_next_increment: Arc<AtomicBool>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next `increment_activity` call fail with a database error.
    pub fn fail_next_increment(&self) {
        self.fail_next_increment.store(true, Ordering::SeqCst);
    }

    pub fn add_user(&self) -> Uuid {
        let user_id = Uuid::new_v4();
        self.tables().users.insert(
            user_id,
            UserProgress {
                user_id,
                crack_score: 0,
                streak: StreakState::default(),
                tasks_completed: 0,
                interviews_completed: 0,
            },
        );
        user_id
    }

    pub fn set_streak(&self, user_id: Uuid, streak: StreakState) {
        if let Some(user) = self.tables().users.get_mut(&user_id) {
            user.streak = streak;
        }
    }

    pub fn set_activity(&self, user_id: Uuid, date: NaiveDate, count: i32) {
        self.tables().activities.insert((user_id, date), count);
    }

    /// Adds a roadmap with `total` tasks, the first `completed` of them done.
    pub fn add_roadmap(
        &self,
        user_id: Uuid,
        total: usize,
        completed: usize,
    ) -> (Uuid, Vec<Uuid>) {
        let roadmap_id = Uuid::new_v4();
        let mut tables = self.tables();
        tables.roadmaps.push(RoadmapRow {
            id: roadmap_id,
            user_id,
            job_title: "Backend Engineer".to_string(),
            target_date: None,
            status: "active".to_string(),
            created_at: Utc::now(),
        });
        let mut task_ids = Vec::with_capacity(total);
        for day in 0..total {
            let id = Uuid::new_v4();
            tables.tasks.push(DailyTaskRow {
                id,
                roadmap_id,
                day_number: day as i32 + 1,
                content: format!("Day {} practice", day + 1),
                is_completed: day < completed,
                created_at: Utc::now(),
            });
            task_ids.push(id);
        }
        (roadmap_id, task_ids)
    }

    pub fn add_interview(&self, user_id: Uuid, score: Option<i32>) -> Uuid {
        let id = Uuid::new_v4();
        let mut tables = self.tables();
        let offset = tables.interviews.len() as i64;
        tables.interviews.push(InterviewRow {
            id,
            user_id,
            interview_type: "chat".to_string(),
            transcript: "Tell me about yourself".to_string(),
            ai_feedback_json: None,
            score,
            created_at: Utc::now() + Duration::seconds(offset),
        });
        id
    }

    pub fn add_profile(&self, user_id: Uuid, streak: StreakState) -> Uuid {
        let id = Uuid::new_v4();
        self.tables().profiles.push(ProfileRow {
            id,
            user_id,
            target_company: Some("Acme".to_string()),
            target_role: Some("SDE".to_string()),
            deadline: None,
            job_description: None,
            experience_level: Some("intermediate".to_string()),
            current_streak: streak.stored_current(),
            last_activity_date: streak.last_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        id
    }

    pub fn progress(&self, user_id: Uuid) -> Option<UserProgress> {
        self.tables().users.get(&user_id).cloned()
    }

    pub fn task_completed(&self, task_id: Uuid) -> Option<bool> {
        self.tables()
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .map(|t| t.is_completed)
    }

    pub fn interview_count(&self, user_id: Uuid) -> usize {
        self.tables()
            .interviews
            .iter()
            .filter(|i| i.user_id == user_id)
            .count()
    }
}

struct InMemoryTx {
    working: InMemoryProgressStore,
    target: Arc<Mutex<Tables>>,
    _gate: OwnedMutexGuard<()>,
}

#[async_trait]
impl TransactionalStore for InMemoryProgressStore {
    async fn begin(&self) -> Result<Box<dyn ProgressTx>, AppError> {
        let gate = self.tx_gate.clone().lock_owned().await;
        let snapshot = self.tables().clone();
        Ok(Box::new(InMemoryTx {
            working: InMemoryProgressStore {
                tables: Arc::new(Mutex::new(snapshot)),
                tx_gate: self.tx_gate.clone(),
                fail_next_increment: self.fail_next_increment.clone(),
            },
            target: self.tables.clone(),
            _gate: gate,
        }))
    }
}

#[async_trait]
impl ProgressTx for InMemoryTx {
    fn store(&self) -> &dyn ProgressStore {
        &self.working
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let committed = std::mem::take(&mut *self.working.tables());
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = committed;
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn load_progress(&self, user_id: Uuid) -> Result<Option<UserProgress>, AppError> {
        Ok(self.progress(user_id))
    }

    async fn lock_progress(&self, user_id: Uuid) -> Result<Option<UserProgress>, AppError> {
        Ok(self.progress(user_id))
    }

    async fn save_streak(&self, user_id: Uuid, streak: &StreakState) -> Result<bool, AppError> {
        let mut tables = self.tables();
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::user_not_found(user_id))?;
        if let (Some(stored), Some(next)) = (user.streak.last_active, streak.last_active) {
            if stored >= next {
                return Ok(false);
            }
        }
        user.streak = *streak;
        Ok(true)
    }

    async fn save_crack_score(&self, user_id: Uuid, score: i32) -> Result<(), AppError> {
        let mut tables = self.tables();
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::user_not_found(user_id))?;
        user.crack_score = score;
        Ok(())
    }

    async fn bump_counter(&self, user_id: Uuid, counter: ProgressCounter) -> Result<(), AppError> {
        let mut tables = self.tables();
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::user_not_found(user_id))?;
        match counter {
            ProgressCounter::TasksCompleted => user.tasks_completed += 1,
            ProgressCounter::InterviewsCompleted => user.interviews_completed += 1,
        }
        Ok(())
    }

    async fn increment_activity(&self, user_id: Uuid, date: NaiveDate) -> Result<i32, AppError> {
        if self.fail_next_increment.swap(false, Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut tables = self.tables();
        let count = tables.activities.entry((user_id, date)).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn activity_count(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<i32>, AppError> {
        Ok(self.tables().activities.get(&(user_id, date)).copied())
    }

    async fn activity_since(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<ActivityRow>, AppError> {
        Ok(self
            .tables()
            .activities
            .range((user_id, since)..=(user_id, NaiveDate::MAX))
            .map(|(&(user_id, activity_date), &count)| ActivityRow {
                user_id,
                activity_date,
                count,
            })
            .collect())
    }

    async fn score_history(&self, user_id: Uuid) -> Result<ScoreHistory, AppError> {
        let tables = self.tables();
        let roadmaps = tables
            .roadmaps
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| {
                let tasks = tables.tasks.iter().filter(|t| t.roadmap_id == r.id);
                RoadmapTally {
                    roadmap_id: r.id,
                    total_tasks: tasks.clone().count() as i64,
                    completed_tasks: tasks.filter(|t| t.is_completed).count() as i64,
                }
            })
            .collect();
        let interview_scores = tables
            .interviews
            .iter()
            .filter(|i| i.user_id == user_id)
            .map(|i| i.score)
            .collect();
        Ok(ScoreHistory {
            roadmaps,
            interview_scores,
        })
    }

    async fn insert_roadmap(&self, roadmap: NewRoadmap) -> Result<RoadmapRow, AppError> {
        let row = RoadmapRow {
            id: Uuid::new_v4(),
            user_id: roadmap.user_id,
            job_title: roadmap.job_title,
            target_date: roadmap.target_date,
            status: "active".to_string(),
            created_at: Utc::now(),
        };
        self.tables().roadmaps.push(row.clone());
        Ok(row)
    }

    async fn find_roadmap(&self, roadmap_id: Uuid) -> Result<Option<RoadmapRow>, AppError> {
        Ok(self
            .tables()
            .roadmaps
            .iter()
            .find(|r| r.id == roadmap_id)
            .cloned())
    }

    async fn list_roadmaps(&self, user_id: Uuid) -> Result<Vec<RoadmapRow>, AppError> {
        Ok(self
            .tables()
            .roadmaps
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_task(&self, task: NewTask) -> Result<DailyTaskRow, AppError> {
        let row = DailyTaskRow {
            id: Uuid::new_v4(),
            roadmap_id: task.roadmap_id,
            day_number: task.day_number,
            content: task.content,
            is_completed: false,
            created_at: Utc::now(),
        };
        self.tables().tasks.push(row.clone());
        Ok(row)
    }

    async fn list_tasks(&self, roadmap_id: Uuid) -> Result<Vec<DailyTaskRow>, AppError> {
        let mut tasks: Vec<DailyTaskRow> = self
            .tables()
            .tasks
            .iter()
            .filter(|t| t.roadmap_id == roadmap_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.day_number);
        Ok(tasks)
    }

    async fn find_task(&self, task_id: Uuid) -> Result<Option<TaskOwnership>, AppError> {
        let tables = self.tables();
        Ok(tables.tasks.iter().find(|t| t.id == task_id).and_then(|t| {
            tables
                .roadmaps
                .iter()
                .find(|r| r.id == t.roadmap_id)
                .map(|r| TaskOwnership {
                    task_id: t.id,
                    roadmap_id: r.id,
                    user_id: r.user_id,
                    is_completed: t.is_completed,
                })
        }))
    }

    async fn set_task_completed(&self, task_id: Uuid, completed: bool) -> Result<bool, AppError> {
        let mut tables = self.tables();
        match tables.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) if task.is_completed != completed => {
                task.is_completed = completed;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_interview(&self, interview: NewInterview) -> Result<InterviewRow, AppError> {
        let mut tables = self.tables();
        let offset = tables.interviews.len() as i64;
        let row = InterviewRow {
            id: Uuid::new_v4(),
            user_id: interview.user_id,
            interview_type: interview.interview_type.as_str().to_string(),
            transcript: interview.transcript,
            ai_feedback_json: Some(interview.ai_feedback_json),
            score: Some(interview.score),
            created_at: Utc::now() + Duration::seconds(offset),
        };
        tables.interviews.push(row.clone());
        Ok(row)
    }

    async fn find_interview(&self, interview_id: Uuid) -> Result<Option<InterviewRow>, AppError> {
        Ok(self
            .tables()
            .interviews
            .iter()
            .find(|i| i.id == interview_id)
            .cloned())
    }

    async fn list_interviews(&self, user_id: Uuid) -> Result<Vec<InterviewRow>, AppError> {
        let mut rows: Vec<InterviewRow> = self
            .tables()
            .interviews
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn load_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>, AppError> {
        Ok(self
            .tables()
            .profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn upsert_profile(&self, update: ProfileUpdate) -> Result<ProfileRow, AppError> {
        let mut tables = self.tables();
        let experience_level = update.experience_level.map(|l| l.as_str().to_string());
        if let Some(profile) = tables
            .profiles
            .iter_mut()
            .find(|p| p.user_id == update.user_id)
        {
            profile.target_company = update.target_company;
            profile.target_role = update.target_role;
            profile.deadline = update.deadline;
            profile.job_description = update.job_description;
            profile.experience_level = experience_level;
            profile.updated_at = Utc::now();
            return Ok(profile.clone());
        }
        let row = ProfileRow {
            id: Uuid::new_v4(),
            user_id: update.user_id,
            target_company: update.target_company,
            target_role: update.target_role,
            deadline: update.deadline,
            job_description: update.job_description,
            experience_level,
            current_streak: 0,
            last_activity_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        tables.profiles.push(row.clone());
        Ok(row)
    }

    async fn save_profile_streak(
        &self,
        profile_id: Uuid,
        streak: &StreakState,
    ) -> Result<(), AppError> {
        if let Some(profile) = self
            .tables()
            .profiles
            .iter_mut()
            .find(|p| p.id == profile_id)
        {
            profile.current_streak = streak.stored_current();
            profile.last_activity_date = streak.last_active;
            profile.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uncommitted_transaction_is_discarded() {
        let store = InMemoryProgressStore::new();
        let user = store.add_user();
        {
            let tx = store.begin().await.unwrap();
            tx.store()
                .bump_counter(user, ProgressCounter::TasksCompleted)
                .await
                .unwrap();
        }
        assert_eq!(store.progress(user).unwrap().tasks_completed, 0);
    }

    #[tokio::test]
    async fn test_committed_transaction_is_visible() {
        let store = InMemoryProgressStore::new();
        let user = store.add_user();
        let tx = store.begin().await.unwrap();
        tx.store()
            .bump_counter(user, ProgressCounter::InterviewsCompleted)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.progress(user).unwrap().interviews_completed, 1);
    }
}
