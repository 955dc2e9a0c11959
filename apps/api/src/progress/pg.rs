//! PostgreSQL implementation of the progress store.
//!
//! Every statement lives once in [`sql`] and runs against a `PgConnection`:
//! a pooled connection for [`PgProgressStore`], the open transaction for
//! [`PgTransaction`].

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::activity::ActivityRow;
use crate::models::interview::{InterviewRow, NewInterview};
use crate::models::profile::{ProfileRow, ProfileUpdate};
use crate::models::roadmap::{DailyTaskRow, NewRoadmap, NewTask, RoadmapRow, TaskOwnership};
use crate::progress::scoring::ScoreHistory;
use crate::progress::store::{
    ProgressCounter, ProgressStore, ProgressTx, TransactionalStore, UserProgress,
};
use crate::progress::streak::StreakState;

pub struct PgProgressStore {
    pool: PgPool,
}

impl PgProgressStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionalStore for PgProgressStore {
    async fn begin(&self) -> Result<Box<dyn ProgressTx>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx: Mutex::new(tx) }))
    }
}

#[async_trait]
impl ProgressStore for PgProgressStore {
    async fn load_progress(&self, user_id: Uuid) -> Result<Option<UserProgress>, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::load_progress(&mut conn, user_id).await
    }

    async fn lock_progress(&self, user_id: Uuid) -> Result<Option<UserProgress>, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::lock_progress(&mut conn, user_id).await
    }

    async fn save_streak(&self, user_id: Uuid, streak: &StreakState) -> Result<bool, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::save_streak(&mut conn, user_id, streak).await
    }

    async fn save_crack_score(&self, user_id: Uuid, score: i32) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::save_crack_score(&mut conn, user_id, score).await
    }

    async fn bump_counter(&self, user_id: Uuid, counter: ProgressCounter) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::bump_counter(&mut conn, user_id, counter).await
    }

    async fn increment_activity(&self, user_id: Uuid, date: NaiveDate) -> Result<i32, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::increment_activity(&mut conn, user_id, date).await
    }

    async fn activity_count(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<i32>, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::activity_count(&mut conn, user_id, date).await
    }

    async fn activity_since(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<ActivityRow>, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::activity_since(&mut conn, user_id, since).await
    }

    async fn score_history(&self, user_id: Uuid) -> Result<ScoreHistory, AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        let history = sql::score_history(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(history)
    }

    async fn insert_roadmap(&self, roadmap: NewRoadmap) -> Result<RoadmapRow, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::insert_roadmap(&mut conn, roadmap).await
    }

    async fn find_roadmap(&self, roadmap_id: Uuid) -> Result<Option<RoadmapRow>, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::find_roadmap(&mut conn, roadmap_id).await
    }

    async fn list_roadmaps(&self, user_id: Uuid) -> Result<Vec<RoadmapRow>, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::list_roadmaps(&mut conn, user_id).await
    }

    async fn insert_task(&self, task: NewTask) -> Result<DailyTaskRow, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::insert_task(&mut conn, task).await
    }

    async fn list_tasks(&self, roadmap_id: Uuid) -> Result<Vec<DailyTaskRow>, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::list_tasks(&mut conn, roadmap_id).await
    }

    async fn find_task(&self, task_id: Uuid) -> Result<Option<TaskOwnership>, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::find_task(&mut conn, task_id).await
    }

    async fn set_task_completed(&self, task_id: Uuid, completed: bool) -> Result<bool, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::set_task_completed(&mut conn, task_id, completed).await
    }

    async fn insert_interview(&self, interview: NewInterview) -> Result<InterviewRow, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::insert_interview(&mut conn, interview).await
    }

    async fn find_interview(&self, interview_id: Uuid) -> Result<Option<InterviewRow>, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::find_interview(&mut conn, interview_id).await
    }

    async fn list_interviews(&self, user_id: Uuid) -> Result<Vec<InterviewRow>, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::list_interviews(&mut conn, user_id).await
    }

    async fn load_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::load_profile(&mut conn, user_id).await
    }

    async fn upsert_profile(&self, update: ProfileUpdate) -> Result<ProfileRow, AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::upsert_profile(&mut conn, update).await
    }

    async fn save_profile_streak(
        &self,
        profile_id: Uuid,
        streak: &StreakState,
    ) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;
        sql::save_profile_streak(&mut conn, profile_id, streak).await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transaction
// ────────────────────────────────────────────────────────────────────────────

/// One write transaction. sqlx rolls it back when dropped uncommitted.
pub struct PgTransaction {
    tx: Mutex<Transaction<'static, Postgres>>,
}

#[async_trait]
impl ProgressTx for PgTransaction {
    fn store(&self) -> &dyn ProgressStore {
        self
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let PgTransaction { tx } = *self;
        tx.into_inner().commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for PgTransaction {
    async fn load_progress(&self, user_id: Uuid) -> Result<Option<UserProgress>, AppError> {
        let mut tx = self.tx.lock().await;
        sql::load_progress(&mut tx, user_id).await
    }

    async fn lock_progress(&self, user_id: Uuid) -> Result<Option<UserProgress>, AppError> {
        let mut tx = self.tx.lock().await;
        sql::lock_progress(&mut tx, user_id).await
    }

    async fn save_streak(&self, user_id: Uuid, streak: &StreakState) -> Result<bool, AppError> {
        let mut tx = self.tx.lock().await;
        sql::save_streak(&mut tx, user_id, streak).await
    }

    async fn save_crack_score(&self, user_id: Uuid, score: i32) -> Result<(), AppError> {
        let mut tx = self.tx.lock().await;
        sql::save_crack_score(&mut tx, user_id, score).await
    }

    async fn bump_counter(&self, user_id: Uuid, counter: ProgressCounter) -> Result<(), AppError> {
        let mut tx = self.tx.lock().await;
        sql::bump_counter(&mut tx, user_id, counter).await
    }

    async fn increment_activity(&self, user_id: Uuid, date: NaiveDate) -> Result<i32, AppError> {
        let mut tx = self.tx.lock().await;
        sql::increment_activity(&mut tx, user_id, date).await
    }

    async fn activity_count(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<i32>, AppError> {
        let mut tx = self.tx.lock().await;
        sql::activity_count(&mut tx, user_id, date).await
    }

    async fn activity_since(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<ActivityRow>, AppError> {
        let mut tx = self.tx.lock().await;
        sql::activity_since(&mut tx, user_id, since).await
    }

    async fn score_history(&self, user_id: Uuid) -> Result<ScoreHistory, AppError> {
        // Sees this transaction's own writes; the user row lock keeps other
        // events for the same user out until commit.
        let mut tx = self.tx.lock().await;
        sql::score_history(&mut tx, user_id).await
    }

    async fn insert_roadmap(&self, roadmap: NewRoadmap) -> Result<RoadmapRow, AppError> {
        let mut tx = self.tx.lock().await;
        sql::insert_roadmap(&mut tx, roadmap).await
    }

    async fn find_roadmap(&self, roadmap_id: Uuid) -> Result<Option<RoadmapRow>, AppError> {
        let mut tx = self.tx.lock().await;
        sql::find_roadmap(&mut tx, roadmap_id).await
    }

    async fn list_roadmaps(&self, user_id: Uuid) -> Result<Vec<RoadmapRow>, AppError> {
        let mut tx = self.tx.lock().await;
        sql::list_roadmaps(&mut tx, user_id).await
    }

    async fn insert_task(&self, task: NewTask) -> Result<DailyTaskRow, AppError> {
        let mut tx = self.tx.lock().await;
        sql::insert_task(&mut tx, task).await
    }

    async fn list_tasks(&self, roadmap_id: Uuid) -> Result<Vec<DailyTaskRow>, AppError> {
        let mut tx = self.tx.lock().await;
        sql::list_tasks(&mut tx, roadmap_id).await
    }

    async fn find_task(&self, task_id: Uuid) -> Result<Option<TaskOwnership>, AppError> {
        let mut tx = self.tx.lock().await;
        sql::find_task(&mut tx, task_id).await
    }

    async fn set_task_completed(&self, task_id: Uuid, completed: bool) -> Result<bool, AppError> {
        let mut tx = self.tx.lock().await;
        sql::set_task_completed(&mut tx, task_id, completed).await
    }

    async fn insert_interview(&self, interview: NewInterview) -> Result<InterviewRow, AppError> {
        let mut tx = self.tx.lock().await;
        sql::insert_interview(&mut tx, interview).await
    }

    async fn find_interview(&self, interview_id: Uuid) -> Result<Option<InterviewRow>, AppError> {
        let mut tx = self.tx.lock().await;
        sql::find_interview(&mut tx, interview_id).await
    }

    async fn list_interviews(&self, user_id: Uuid) -> Result<Vec<InterviewRow>, AppError> {
        let mut tx = self.tx.lock().await;
        sql::list_interviews(&mut tx, user_id).await
    }

    async fn load_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>, AppError> {
        let mut tx = self.tx.lock().await;
        sql::load_profile(&mut tx, user_id).await
    }

    async fn upsert_profile(&self, update: ProfileUpdate) -> Result<ProfileRow, AppError> {
        let mut tx = self.tx.lock().await;
        sql::upsert_profile(&mut tx, update).await
    }

    async fn save_profile_streak(
        &self,
        profile_id: Uuid,
        streak: &StreakState,
    ) -> Result<(), AppError> {
        let mut tx = self.tx.lock().await;
        sql::save_profile_streak(&mut tx, profile_id, streak).await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Statements
// ────────────────────────────────────────────────────────────────────────────

mod sql {
    use chrono::NaiveDate;
    use sqlx::PgConnection;
    use uuid::Uuid;

    use crate::errors::AppError;
    use crate::models::activity::ActivityRow;
    use crate::models::interview::{InterviewRow, NewInterview};
    use crate::models::profile::{ProfileRow, ProfileUpdate};
    use crate::models::roadmap::{
        DailyTaskRow, NewRoadmap, NewTask, RoadmapRow, RoadmapTally, TaskOwnership,
    };
    use crate::models::user::UserRow;
    use crate::progress::scoring::ScoreHistory;
    use crate::progress::store::{ProgressCounter, UserProgress};
    use crate::progress::streak::StreakState;

    pub async fn load_progress(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<UserProgress>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(UserProgress::from))
    }

    pub async fn lock_progress(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<UserProgress>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(UserProgress::from))
    }

    pub async fn save_streak(
        conn: &mut PgConnection,
        user_id: Uuid,
        streak: &StreakState,
    ) -> Result<bool, AppError> {
        // The date guard keeps the once-per-day rule across processes.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET day_streak = $2, last_streak_date = $3, updated_at = now()
            WHERE id = $1
              AND (last_streak_date IS NULL OR last_streak_date < $3)
            "#,
        )
        .bind(user_id)
        .bind(streak.stored_current())
        .bind(streak.last_active)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn save_crack_score(
        conn: &mut PgConnection,
        user_id: Uuid,
        score: i32,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE users SET crack_score = $2, updated_at = now() WHERE id = $1")
                .bind(user_id)
                .bind(score)
                .execute(&mut *conn)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::user_not_found(user_id));
        }
        Ok(())
    }

    pub async fn bump_counter(
        conn: &mut PgConnection,
        user_id: Uuid,
        counter: ProgressCounter,
    ) -> Result<(), AppError> {
        let column = counter.column();
        let sql =
            format!("UPDATE users SET {column} = {column} + 1, updated_at = now() WHERE id = $1");
        let result = sqlx::query(&sql)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::user_not_found(user_id));
        }
        Ok(())
    }

    pub async fn increment_activity(
        conn: &mut PgConnection,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<i32, AppError> {
        Ok(sqlx::query_scalar(
            r#"
            INSERT INTO user_activities (user_id, activity_date, count)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id, activity_date)
            DO UPDATE SET count = user_activities.count + 1
            RETURNING count
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(&mut *conn)
        .await?)
    }

    pub async fn activity_count(
        conn: &mut PgConnection,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<i32>, AppError> {
        Ok(sqlx::query_scalar(
            "SELECT count FROM user_activities WHERE user_id = $1 AND activity_date = $2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&mut *conn)
        .await?)
    }

    pub async fn activity_since(
        conn: &mut PgConnection,
        user_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<ActivityRow>, AppError> {
        Ok(sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT user_id, activity_date, count
            FROM user_activities
            WHERE user_id = $1 AND activity_date >= $2
            ORDER BY activity_date ASC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&mut *conn)
        .await?)
    }

    pub async fn score_history(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<ScoreHistory, AppError> {
        let roadmaps = sqlx::query_as::<_, RoadmapTally>(
            r#"
            SELECT r.id AS roadmap_id,
                   COUNT(t.id) AS total_tasks,
                   COUNT(t.id) FILTER (WHERE t.is_completed) AS completed_tasks
            FROM roadmaps r
            LEFT JOIN daily_tasks t ON t.roadmap_id = r.id
            WHERE r.user_id = $1
            GROUP BY r.id
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        let interview_scores: Vec<Option<i32>> =
            sqlx::query_scalar("SELECT score FROM interviews WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&mut *conn)
                .await?;

        Ok(ScoreHistory {
            roadmaps,
            interview_scores,
        })
    }

    pub async fn insert_roadmap(
        conn: &mut PgConnection,
        roadmap: NewRoadmap,
    ) -> Result<RoadmapRow, AppError> {
        Ok(sqlx::query_as::<_, RoadmapRow>(
            r#"
            INSERT INTO roadmaps (id, user_id, job_title, target_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(roadmap.user_id)
        .bind(&roadmap.job_title)
        .bind(roadmap.target_date)
        .fetch_one(&mut *conn)
        .await?)
    }

    pub async fn find_roadmap(
        conn: &mut PgConnection,
        roadmap_id: Uuid,
    ) -> Result<Option<RoadmapRow>, AppError> {
        Ok(
            sqlx::query_as::<_, RoadmapRow>("SELECT * FROM roadmaps WHERE id = $1")
                .bind(roadmap_id)
                .fetch_optional(&mut *conn)
                .await?,
        )
    }

    pub async fn list_roadmaps(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Vec<RoadmapRow>, AppError> {
        Ok(sqlx::query_as::<_, RoadmapRow>(
            "SELECT * FROM roadmaps WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?)
    }

    pub async fn insert_task(
        conn: &mut PgConnection,
        task: NewTask,
    ) -> Result<DailyTaskRow, AppError> {
        Ok(sqlx::query_as::<_, DailyTaskRow>(
            r#"
            INSERT INTO daily_tasks (id, roadmap_id, day_number, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(task.roadmap_id)
        .bind(task.day_number)
        .bind(&task.content)
        .fetch_one(&mut *conn)
        .await?)
    }

    pub async fn list_tasks(
        conn: &mut PgConnection,
        roadmap_id: Uuid,
    ) -> Result<Vec<DailyTaskRow>, AppError> {
        Ok(sqlx::query_as::<_, DailyTaskRow>(
            "SELECT * FROM daily_tasks WHERE roadmap_id = $1 \
             ORDER BY day_number ASC, created_at ASC",
        )
        .bind(roadmap_id)
        .fetch_all(&mut *conn)
        .await?)
    }

    pub async fn find_task(
        conn: &mut PgConnection,
        task_id: Uuid,
    ) -> Result<Option<TaskOwnership>, AppError> {
        Ok(sqlx::query_as::<_, TaskOwnership>(
            r#"
            SELECT t.id AS task_id, t.roadmap_id, r.user_id, t.is_completed
            FROM daily_tasks t
            JOIN roadmaps r ON r.id = t.roadmap_id
            WHERE t.id = $1
            "#,
        )
        .bind(task_id)
        .fetch_optional(&mut *conn)
        .await?)
    }

    pub async fn set_task_completed(
        conn: &mut PgConnection,
        task_id: Uuid,
        completed: bool,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE daily_tasks SET is_completed = $2 WHERE id = $1 AND is_completed <> $2",
        )
        .bind(task_id)
        .bind(completed)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_interview(
        conn: &mut PgConnection,
        interview: NewInterview,
    ) -> Result<InterviewRow, AppError> {
        Ok(sqlx::query_as::<_, InterviewRow>(
            r#"
            INSERT INTO interviews
                (id, user_id, interview_type, transcript, ai_feedback_json, score)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(interview.user_id)
        .bind(interview.interview_type.as_str())
        .bind(&interview.transcript)
        .bind(&interview.ai_feedback_json)
        .bind(interview.score)
        .fetch_one(&mut *conn)
        .await?)
    }

    pub async fn find_interview(
        conn: &mut PgConnection,
        interview_id: Uuid,
    ) -> Result<Option<InterviewRow>, AppError> {
        Ok(
            sqlx::query_as::<_, InterviewRow>("SELECT * FROM interviews WHERE id = $1")
                .bind(interview_id)
                .fetch_optional(&mut *conn)
                .await?,
        )
    }

    pub async fn list_interviews(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Vec<InterviewRow>, AppError> {
        Ok(sqlx::query_as::<_, InterviewRow>(
            "SELECT * FROM interviews WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?)
    }

    pub async fn load_profile(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<ProfileRow>, AppError> {
        Ok(
            sqlx::query_as::<_, ProfileRow>("SELECT * FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?,
        )
    }

    pub async fn upsert_profile(
        conn: &mut PgConnection,
        update: ProfileUpdate,
    ) -> Result<ProfileRow, AppError> {
        Ok(sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO user_profiles
                (id, user_id, target_company, target_role, deadline,
                 job_description, experience_level)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                target_company   = EXCLUDED.target_company,
                target_role      = EXCLUDED.target_role,
                deadline         = EXCLUDED.deadline,
                job_description  = EXCLUDED.job_description,
                experience_level = EXCLUDED.experience_level,
                updated_at       = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(update.user_id)
        .bind(&update.target_company)
        .bind(&update.target_role)
        .bind(update.deadline)
        .bind(&update.job_description)
        .bind(update.experience_level.map(|level| level.as_str()))
        .fetch_one(&mut *conn)
        .await?)
    }

    pub async fn save_profile_streak(
        conn: &mut PgConnection,
        profile_id: Uuid,
        streak: &StreakState,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE user_profiles
            SET current_streak = $2, last_activity_date = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(profile_id)
        .bind(streak.stored_current())
        .bind(streak.last_active)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
