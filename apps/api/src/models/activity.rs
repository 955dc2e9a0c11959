use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One ledger row: how many qualifying events a user produced on a calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ActivityRow {
    pub user_id: Uuid,
    pub activity_date: NaiveDate,
    pub count: i32,
}
