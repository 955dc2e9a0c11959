use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    /// Cached composite score; recomputed by the score calculator, never adjusted in place.
    pub crack_score: i32,
    pub day_streak: i32,
    /// Calendar day on which `day_streak` was last evaluated.
    pub last_streak_date: Option<NaiveDate>,
    pub tasks_completed: i32,
    pub interviews_completed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
