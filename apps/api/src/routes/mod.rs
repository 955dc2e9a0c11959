pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::interview::handlers as interviews;
use crate::profile::handlers as profile;
use crate::progress::handlers as progress;
use crate::roadmap::handlers as roadmaps;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Progress & crack score
        .route("/api/v1/progress", get(progress::handle_get_progress))
        .route("/api/v1/progress/score", get(progress::handle_get_score))
        .route(
            "/api/v1/progress/score/refresh",
            post(progress::handle_refresh_score),
        )
        .route("/api/v1/progress/activity", get(progress::handle_activity))
        .route("/api/v1/progress/touch", post(progress::handle_touch))
        // Roadmaps & tasks
        .route(
            "/api/v1/roadmaps",
            post(roadmaps::handle_create_roadmap).get(roadmaps::handle_list_roadmaps),
        )
        .route("/api/v1/roadmaps/:id", get(roadmaps::handle_get_roadmap))
        .route(
            "/api/v1/roadmaps/:id/tasks",
            get(roadmaps::handle_list_tasks).post(roadmaps::handle_create_task),
        )
        .route(
            "/api/v1/tasks/:id/complete",
            patch(roadmaps::handle_complete_task),
        )
        // Interviews
        .route(
            "/api/v1/interviews",
            post(interviews::handle_submit_interview).get(interviews::handle_interview_history),
        )
        .route("/api/v1/interviews/:id", get(interviews::handle_get_interview))
        // Profile
        .route(
            "/api/v1/profile",
            get(profile::handle_get_profile).put(profile::handle_save_profile),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::interview::feedback::CannedFeedbackGenerator;
    use crate::progress::memory::InMemoryProgressStore;
    use crate::progress::service::ProgressService;
    use crate::progress::streak::StreakState;
    use crate::progress::today;

    fn test_app() -> (Arc<InMemoryProgressStore>, Router) {
        let store = Arc::new(InMemoryProgressStore::new());
        let state = AppState {
            progress: ProgressService::new(store.clone()),
            feedback: Arc::new(CannedFeedbackGenerator),
            config: Config {
                database_url: "postgres://unused".to_string(),
                anthropic_api_key: None,
                port: 0,
                rust_log: "info".to_string(),
                db_max_connections: 1,
                activity_window_days: 30,
            },
        };
        (store, build_router(state))
    }

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (_, app) = test_app();
        let (status, body) = send(app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_score_for_fresh_user() {
        let (store, app) = test_app();
        let user = store.add_user();
        let uri = format!("/api/v1/progress/score?user_id={user}");
        let (status, body) = send(app, Method::GET, &uri, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 0);
        assert_eq!(body["breakdown"]["roadmap_score"], 0);
        assert_eq!(body["recommendations"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_score_for_unknown_user_is_404() {
        let (_, app) = test_app();
        let uri = format!("/api/v1/progress/score?user_id={}", Uuid::new_v4());
        let (status, body) = send(app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_submit_interview_uses_fallback_feedback_score() {
        let (store, app) = test_app();
        let user = store.add_user();
        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/interviews",
            Some(json!({
                "user_id": user,
                "interview_type": "chat",
                "transcript": "Q: What is a lifetime? A: ...",
                "job_role": "Backend Engineer"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["interview"]["score"], 70);
        assert_eq!(body["event"]["progress"]["interviews_completed"], 1);
        assert_eq!(store.progress(user).unwrap().streak.current, 1);
    }

    #[tokio::test]
    async fn test_submit_interview_rejects_blank_transcript() {
        let (store, app) = test_app();
        let user = store.add_user();
        let (status, _) = send(
            app,
            Method::POST,
            "/api/v1/interviews",
            Some(json!({
                "user_id": user,
                "interview_type": "video",
                "transcript": "   ",
                "job_role": "SRE"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_complete_task_endpoint() {
        let (store, app) = test_app();
        let user = store.add_user();
        let (_, tasks) = store.add_roadmap(user, 2, 0);
        let uri = format!("/api/v1/tasks/{}/complete", tasks[0]);

        let (status, body) = send(
            app,
            Method::PATCH,
            &uri,
            Some(json!({ "user_id": user, "completed": true })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changed"], true);
        assert_eq!(body["event"]["activity_today"], 1);
    }

    #[tokio::test]
    async fn test_activity_report_rejects_oversized_window() {
        let (store, app) = test_app();
        let user = store.add_user();
        let uri = format!("/api/v1/progress/activity?user_id={user}&days=400");
        let (status, _) = send(app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_activity_report_lists_today() {
        let (store, app) = test_app();
        let user = store.add_user();
        store.set_activity(user, today(), 2);
        let uri = format!("/api/v1/progress/activity?user_id={user}");
        let (status, body) = send(app, Method::GET, &uri, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_events"], 2);
        assert_eq!(body["days"][today().to_string()], 2);
    }

    #[tokio::test]
    async fn test_profile_read_starts_streak() {
        let (store, app) = test_app();
        let user = store.add_user();
        store.add_profile(user, StreakState::default());
        let uri = format!("/api/v1/profile?user_id={user}");
        let (status, body) = send(app, Method::GET, &uri, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_streak"], 1);
    }

    #[tokio::test]
    async fn test_create_roadmap_then_list_and_get() {
        let (store, app) = test_app();
        let user = store.add_user();
        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/v1/roadmaps",
            Some(json!({
                "user_id": user,
                "job_title": "Backend Engineer",
                "target_date": "2026-12-01",
                "tasks": ["Review ownership", "Mock system design"]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tasks"].as_array().unwrap().len(), 2);
        assert_eq!(body["tasks"][1]["day_number"], 2);
        assert_eq!(body["score"]["breakdown"]["roadmap_score"], 0);
        let roadmap_id = body["roadmap"]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/roadmaps?user_id={user}");
        let (status, body) = send(app.clone(), Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["job_title"], "Backend Engineer");

        let uri = format!("/api/v1/roadmaps/{roadmap_id}?user_id={user}");
        let (status, body) = send(app.clone(), Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], roadmap_id.as_str());

        let stranger = store.add_user();
        let uri = format!("/api/v1/roadmaps/{roadmap_id}?user_id={stranger}");
        let (status, _) = send(app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_roadmap_rejects_blank_title() {
        let (store, app) = test_app();
        let user = store.add_user();
        let (status, _) = send(
            app,
            Method::POST,
            "/api/v1/roadmaps",
            Some(json!({ "user_id": user, "job_title": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_add_task_then_complete_it() {
        let (store, app) = test_app();
        let user = store.add_user();
        let (roadmap_id, _) = store.add_roadmap(user, 1, 1);

        let uri = format!("/api/v1/roadmaps/{roadmap_id}/tasks");
        let (status, body) = send(
            app.clone(),
            Method::POST,
            &uri,
            Some(json!({ "user_id": user, "content": "Write a trie" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task"]["day_number"], 2);
        assert_eq!(body["task"]["is_completed"], false);
        let task_id = body["task"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(app.clone(), Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let uri = format!("/api/v1/tasks/{task_id}/complete");
        let (status, body) = send(
            app,
            Method::PATCH,
            &uri,
            Some(json!({ "user_id": user, "completed": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changed"], true);
        assert_eq!(body["roadmap_id"], roadmap_id.to_string());
        assert_eq!(store.task_completed(task_id.parse().unwrap()), Some(true));
    }

    #[tokio::test]
    async fn test_save_profile_then_read_it() {
        let (store, app) = test_app();
        let user = store.add_user();
        let (status, body) = send(
            app.clone(),
            Method::PUT,
            "/api/v1/profile",
            Some(json!({
                "user_id": user,
                "target_company": "Acme",
                "target_role": "SRE",
                "deadline": "2026-11-30",
                "experience_level": "intermediate"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["target_company"], "Acme");
        assert_eq!(body["current_streak"], 0);

        let uri = format!("/api/v1/profile?user_id={user}");
        let (status, body) = send(app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["target_role"], "SRE");
        assert_eq!(body["experience_level"], "intermediate");
        assert_eq!(body["current_streak"], 1);
    }

    #[tokio::test]
    async fn test_save_profile_rejects_unknown_experience_level() {
        let (store, app) = test_app();
        let user = store.add_user();
        let (status, _) = send(
            app,
            Method::PUT,
            "/api/v1/profile",
            Some(json!({ "user_id": user, "experience_level": "wizard" })),
        )
        .await;
        assert!(status.is_client_error());
    }
}
