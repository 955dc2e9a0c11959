use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    Chat,
    Video,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::Chat => "chat",
            InterviewType::Video => "video",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub interview_type: String,
    pub transcript: String,
    /// Raw feedback text exactly as the generator returned it.
    pub ai_feedback_json: Option<String>,
    pub score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a scored interview submission.
#[derive(Debug, Clone)]
pub struct NewInterview {
    pub user_id: Uuid,
    pub interview_type: InterviewType,
    pub transcript: String,
    pub ai_feedback_json: String,
    pub score: i32,
}
