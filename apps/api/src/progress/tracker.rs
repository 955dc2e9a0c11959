//! Ledger-driven day streak.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::progress::ledger::ActivityLedger;
use crate::progress::store::{ProgressStore, UserProgress};
use crate::progress::streak::StreakTransition;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakUpdate {
    pub progress: UserProgress,
    pub transition: StreakTransition,
}

/// Evaluates the user's streak for `today`. Runs after the triggering event has
/// been recorded in the ledger.
///
/// The streak moves at most once per calendar day: +1 when yesterday has ledger
/// activity, back to 1 otherwise.
pub async fn touch_streak(
    store: &dyn ProgressStore,
    progress: UserProgress,
    today: NaiveDate,
) -> Result<StreakUpdate, AppError> {
    if progress.streak.evaluated_on(today) {
        return Ok(StreakUpdate {
            progress,
            transition: StreakTransition::Unchanged,
        });
    }

    let active_yesterday = match today.pred_opt() {
        Some(yesterday) => {
            ActivityLedger::new(store)
                .has_activity(progress.user_id, yesterday)
                .await?
        }
        None => false,
    };

    let (next, transition) = progress.streak.advance(today, active_yesterday);
    let user_id = progress.user_id;

    if !store.save_streak(user_id, &next).await? {
        // Another writer evaluated today first; report what it stored.
        debug!("Streak for user {user_id} already evaluated on {today}");
        let current = store
            .load_progress(user_id)
            .await?
            .ok_or_else(|| AppError::user_not_found(user_id))?;
        return Ok(StreakUpdate {
            progress: current,
            transition: StreakTransition::Unchanged,
        });
    }

    info!(
        "Streak for user {user_id}: {:?} {} -> {}",
        transition, progress.streak.current, next.current
    );

    Ok(StreakUpdate {
        progress: UserProgress {
            streak: next,
            ..progress
        },
        transition,
    })
}
