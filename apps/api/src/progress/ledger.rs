//! Activity ledger: one counter per user per calendar day.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::progress::store::ProgressStore;

/// Windowed view of the ledger, as served to the activity page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityReport {
    pub since: NaiveDate,
    pub until: NaiveDate,
    pub total_events: i64,
    pub active_days: usize,
    /// Only days with activity appear, keyed `YYYY-MM-DD`, oldest first.
    pub days: BTreeMap<NaiveDate, i32>,
}

pub struct ActivityLedger<'a> {
    store: &'a dyn ProgressStore,
}

impl<'a> ActivityLedger<'a> {
    pub fn new(store: &'a dyn ProgressStore) -> Self {
        Self { store }
    }

    /// Adds one event for `date`. Every call counts; returns the day's new total.
    pub async fn record_activity(&self, user_id: Uuid, date: NaiveDate) -> Result<i32, AppError> {
        self.store.increment_activity(user_id, date).await
    }

    pub async fn count_on(&self, user_id: Uuid, date: NaiveDate) -> Result<i32, AppError> {
        Ok(self.store.activity_count(user_id, date).await?.unwrap_or(0))
    }

    pub async fn has_activity(&self, user_id: Uuid, date: NaiveDate) -> Result<bool, AppError> {
        Ok(self.count_on(user_id, date).await? > 0)
    }

    /// Per-day counts from `since` (inclusive) onward.
    pub async fn activity_log(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, i32>, AppError> {
        Ok(self
            .store
            .activity_since(user_id, since)
            .await?
            .into_iter()
            .map(|row| (row.activity_date, row.count))
            .collect())
    }

    /// The `window_days` calendar days ending on `today`, both ends included.
    pub async fn report(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        window_days: u32,
    ) -> Result<ActivityReport, AppError> {
        let since = window_start(today, window_days);
        let days: BTreeMap<NaiveDate, i32> = self
            .activity_log(user_id, since)
            .await?
            .into_iter()
            .filter(|(date, _)| *date <= today)
            .collect();

        Ok(ActivityReport {
            since,
            until: today,
            total_events: days.values().map(|c| i64::from(*c)).sum(),
            active_days: days.values().filter(|c| **c > 0).count(),
            days,
        })
    }
}

/// First day of a window of `window_days` days ending on `today`.
pub fn window_start(today: NaiveDate, window_days: u32) -> NaiveDate {
    let back = u64::from(window_days.max(1) - 1);
    today
        .checked_sub_days(chrono::Days::new(back))
        .unwrap_or(NaiveDate::MIN)
}
