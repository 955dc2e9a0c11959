//! Day-streak arithmetic shared by the ledger-driven streak and the profile streak.
//!
//! A streak is evaluated at most once per calendar day. On the first evaluation of
//! a day it grows by one when the previous day qualified, otherwise it restarts
//! at 1 ("active today"). What counts as a qualifying previous day is the caller's
//! business: the ledger tracker asks the activity ledger, the profile streak looks
//! at its own last activity date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current: u32,
    /// Last calendar day this streak was evaluated.
    pub last_active: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTransition {
    /// First qualifying day after a zero streak.
    Started,
    Extended,
    /// A gap broke the previous run; the streak is back to 1.
    Reset,
    /// Already evaluated today.
    Unchanged,
}

impl StreakState {
    pub fn new(current: u32, last_active: Option<NaiveDate>) -> Self {
        Self {
            current,
            last_active,
        }
    }

    /// Builds a state from signed storage columns. Negative values never occur in
    /// valid data and are read as zero.
    pub fn from_stored(current: i32, last_active: Option<NaiveDate>) -> Self {
        Self::new(u32::try_from(current).unwrap_or(0), last_active)
    }

    pub fn stored_current(&self) -> i32 {
        i32::try_from(self.current).unwrap_or(i32::MAX)
    }

    pub fn evaluated_on(&self, day: NaiveDate) -> bool {
        self.last_active.is_some_and(|last| last >= day)
    }

    /// Evaluates the streak for `today`.
    ///
    /// A `last_active` on or after `today` leaves the state untouched, which also
    /// absorbs clock skew from a writer that ran ahead.
    pub fn advance(
        &self,
        today: NaiveDate,
        active_yesterday: bool,
    ) -> (StreakState, StreakTransition) {
        if self.evaluated_on(today) {
            return (*self, StreakTransition::Unchanged);
        }

        let (current, transition) = if active_yesterday && self.current > 0 {
            (self.current.saturating_add(1), StreakTransition::Extended)
        } else if self.current == 0 {
            (1, StreakTransition::Started)
        } else {
            (1, StreakTransition::Reset)
        };

        (StreakState::new(current, Some(today)), transition)
    }

    /// Profile flavour: the previous day qualifies iff it is the recorded last
    /// activity date.
    pub fn advance_by_last_active(&self, today: NaiveDate) -> (StreakState, StreakTransition) {
        let active_yesterday = match (self.last_active, today.pred_opt()) {
            (Some(last), Some(yesterday)) => last == yesterday,
            _ => false,
        };
        self.advance(today, active_yesterday)
    }
}
