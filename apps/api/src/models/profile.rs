use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_company: Option<String>,
    pub target_role: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub job_description: Option<String>,
    pub experience_level: Option<String>,
    pub current_streak: i32,
    pub last_activity_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Pro,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "beginner",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Pro => "pro",
        }
    }
}

/// Editable profile fields. The streak columns are never written through this.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub user_id: Uuid,
    pub target_company: Option<String>,
    pub target_role: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub job_description: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
}
