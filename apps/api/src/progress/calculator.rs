//! Loads score history and caches the composite on the user.

use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::progress::scoring::{compute_score, ScoreResult, ScoringWeights};
use crate::progress::store::ProgressStore;

/// Recomputes the crack score from the full stored history. Read-only.
pub async fn calculate(
    store: &dyn ProgressStore,
    user_id: Uuid,
    weights: &ScoringWeights,
) -> Result<ScoreResult, AppError> {
    if store.load_progress(user_id).await?.is_none() {
        return Err(AppError::user_not_found(user_id));
    }
    let history = store.score_history(user_id).await?;
    Ok(compute_score(&history, weights))
}

/// Recomputes and stores the result as the user's cached crack score.
pub async fn persist_score(
    store: &dyn ProgressStore,
    user_id: Uuid,
    weights: &ScoringWeights,
) -> Result<ScoreResult, AppError> {
    let result = calculate(store, user_id, weights).await?;
    store.save_crack_score(user_id, result.score).await?;
    info!("Crack score for user {user_id} is now {}", result.score);
    Ok(result)
}
