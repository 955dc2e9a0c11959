// Progress engine: activity ledger, day streaks and the crack score.
// Pure rules live in `streak` and `scoring`; everything that touches storage goes
// through the `ProgressStore` seam and is driven by `ProgressService`.

pub mod calculator;
pub mod handlers;
pub mod ledger;
pub mod locks;
pub mod pg;
pub mod scoring;
pub mod service;
pub mod store;
pub mod streak;
pub mod tracker;

#[cfg(test)]
pub mod memory;

use chrono::{NaiveDate, Utc};

/// Current calendar day (UTC) used for ledger rows and streak evaluation.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
