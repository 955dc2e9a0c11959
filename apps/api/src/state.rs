use std::sync::Arc;

use crate::config::Config;
use crate::interview::feedback::FeedbackGenerator;
use crate::progress::service::ProgressService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub progress: ProgressService,
    /// Pluggable feedback source. LLM-backed when an API key is configured, canned otherwise.
    pub feedback: Arc<dyn FeedbackGenerator>,
    pub config: Config,
}
