//! Interview feedback — pluggable generator returning a JSON feedback blob.
//!
//! `AppState` holds an `Arc<dyn FeedbackGenerator>`: `LlmFeedbackGenerator` when
//! an API key is configured, `CannedFeedbackGenerator` otherwise. Generators never
//! fail; a broken model call degrades to the canned feedback.

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::interview::prompts::{render_feedback_prompt, FALLBACK_FEEDBACK, FEEDBACK_SYSTEM};
use crate::llm_client::{strip_json_fences, LlmClient};

/// Score used when the feedback has no usable `score` field.
pub const DEFAULT_INTERVIEW_SCORE: i32 = 50;

#[async_trait]
pub trait FeedbackGenerator: Send + Sync {
    async fn generate(&self, transcript: &str, job_role: &str) -> String;
}

pub struct LlmFeedbackGenerator(pub LlmClient);

#[async_trait]
impl FeedbackGenerator for LlmFeedbackGenerator {
    async fn generate(&self, transcript: &str, job_role: &str) -> String {
        let prompt = render_feedback_prompt(job_role, transcript);
        match self.0.complete(&prompt, FEEDBACK_SYSTEM).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Interview feedback generation failed, using fallback: {e}");
                FALLBACK_FEEDBACK.to_string()
            }
        }
    }
}

pub struct CannedFeedbackGenerator;

#[async_trait]
impl FeedbackGenerator for CannedFeedbackGenerator {
    async fn generate(&self, _transcript: &str, _job_role: &str) -> String {
        FALLBACK_FEEDBACK.to_string()
    }
}

/// Pulls the 0–100 score out of a feedback blob.
///
/// Integers are taken as-is, fractional numbers are truncated, and the result is
/// clamped to 0–100. Anything unparseable or missing yields
/// [`DEFAULT_INTERVIEW_SCORE`].
pub fn extract_feedback_score(feedback: &str) -> i32 {
    let parsed: Value = match serde_json::from_str(strip_json_fences(feedback)) {
        Ok(v) => v,
        Err(e) => {
            warn!("Interview feedback is not valid JSON ({e}); defaulting score");
            return DEFAULT_INTERVIEW_SCORE;
        }
    };

    let score = match parsed.get("score") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        _ => None,
    };

    match score {
        Some(s) => s.clamp(0, 100) as i32,
        None => {
            warn!("Interview feedback has no numeric score; defaulting");
            DEFAULT_INTERVIEW_SCORE
        }
    }
}
