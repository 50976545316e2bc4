//! HTTP server for the triage bot.
//!
//! The server does as little as possible: it verifies webhook signatures,
//! parses payloads into typed events, and hands them to the worker over a
//! bounded channel. All GitHub API traffic happens off the request path.
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub webhook deliveries (returns 202 Accepted)
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

use tokio::sync::mpsc;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::webhook_handler;

use crate::worker::TriageJob;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Webhook secret for HMAC signature verification.
    webhook_secret: Vec<u8>,

    /// Sender half of the triage job queue.
    jobs: mpsc::Sender<TriageJob>,
}

impl AppState {
    pub fn new(webhook_secret: impl Into<Vec<u8>>, jobs: mpsc::Sender<TriageJob>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                webhook_secret: webhook_secret.into(),
                jobs,
            }),
        }
    }

    /// Returns the webhook secret.
    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }

    /// Returns the job queue sender.
    pub fn jobs(&self) -> &mpsc::Sender<TriageJob> {
        &self.inner.jobs
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::types::{InstallationId, PrNumber};
    use crate::webhooks::{compute_signature, format_signature_header, SignatureAlgorithm};

    fn test_app_state(secret: &[u8]) -> (AppState, mpsc::Receiver<TriageJob>) {
        let (tx, rx) = mpsc::channel(8);
        (AppState::new(secret.to_vec(), tx), rx)
    }

    fn pr_payload() -> serde_json::Value {
        serde_json::json!({
            "action": "opened",
            "pull_request": {
                "number": 42,
                "user": { "login": "alice" },
                "head": { "ref": "feature-branch" }
            },
            "repository": {
                "name": "spack",
                "owner": { "login": "spack" }
            },
            "installation": { "id": 12345 }
        })
    }

    /// Creates a webhook request signed with `secret`.
    fn signed_request(
        secret: &[u8],
        event_type: &str,
        delivery_id: &str,
        body: &serde_json::Value,
    ) -> Request<Body> {
        let body_bytes = serde_json::to_vec(body).unwrap();
        let digest = compute_signature(SignatureAlgorithm::Sha256, &body_bytes, secret);
        let signature_header = format_signature_header(SignatureAlgorithm::Sha256, &digest);

        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("x-github-event", event_type)
            .header("x-github-delivery", delivery_id)
            .header("x-hub-signature-256", signature_header)
            .body(Body::from(body_bytes))
            .unwrap()
    }

    #[tokio::test]
    async fn health_returns_200() {
        let (state, _rx) = test_app_state(b"secret");
        let app = build_router(state);

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn valid_pull_request_event_is_enqueued() {
        let secret = b"test-secret";
        let (state, mut rx) = test_app_state(secret);
        let app = build_router(state);

        let request = signed_request(
            secret,
            "pull_request",
            "550e8400-e29b-41d4-a716-446655440000",
            &pr_payload(),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let job = rx.try_recv().unwrap();
        assert_eq!(job.delivery.as_str(), "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(job.event.number, PrNumber(42));
        assert_eq!(job.event.author, "alice");
        assert_eq!(job.event.installation, InstallationId(12345));
    }

    #[tokio::test]
    async fn invalid_signature_returns_401_and_enqueues_nothing() {
        let (state, mut rx) = test_app_state(b"correct-secret");
        let app = build_router(state);

        let request = signed_request(b"wrong-secret", "pull_request", "d-1", &pr_payload());

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn legacy_sha1_signature_is_accepted() {
        let secret = b"test-secret";
        let (state, mut rx) = test_app_state(secret);
        let app = build_router(state);

        let body_bytes = serde_json::to_vec(&pr_payload()).unwrap();
        let digest = compute_signature(SignatureAlgorithm::Sha1, &body_bytes, secret);
        let signature_header = format_signature_header(SignatureAlgorithm::Sha1, &digest);

        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("x-github-event", "pull_request")
            .header("x-github-delivery", "d-2")
            .header("x-hub-signature", signature_header)
            .body(Body::from(body_bytes))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn missing_event_header_returns_400() {
        let secret = b"test-secret";
        let (state, _rx) = test_app_state(secret);
        let app = build_router(state);

        let body_bytes = serde_json::to_vec(&pr_payload()).unwrap();
        let digest = compute_signature(SignatureAlgorithm::Sha256, &body_bytes, secret);
        let signature_header = format_signature_header(SignatureAlgorithm::Sha256, &digest);

        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("x-github-delivery", "d-3")
            .header("x-hub-signature-256", signature_header)
            .body(Body::from(body_bytes))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_pull_request_event_is_ignored_with_202() {
        let secret = b"test-secret";
        let (state, mut rx) = test_app_state(secret);
        let app = build_router(state);

        let body = serde_json::json!({ "zen": "Design for failure." });
        let request = signed_request(secret, "ping", "d-4", &body);

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn missing_installation_returns_400() {
        let secret = b"test-secret";
        let (state, _rx) = test_app_state(secret);
        let app = build_router(state);

        let mut body = pr_payload();
        body.as_object_mut().unwrap().remove("installation");
        let request = signed_request(secret, "pull_request", "d-5", &body);

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn full_queue_returns_503() {
        let secret = b"test-secret";
        let (tx, _rx) = mpsc::channel(1);
        let state = AppState::new(secret.to_vec(), tx);

        // Fill the queue.
        let app = build_router(state.clone());
        let response = app
            .oneshot(signed_request(secret, "pull_request", "d-6", &pr_payload()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let app = build_router(state);
        let response = app
            .oneshot(signed_request(secret, "pull_request", "d-7", &pr_payload()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
