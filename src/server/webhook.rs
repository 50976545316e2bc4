//! Webhook endpoint handler.
//!
//! Accepts GitHub webhook deliveries, verifies the signature, parses the
//! payload into a typed event, and enqueues it for the triage worker before
//! returning 202 Accepted. Nothing slow happens on the request path.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::types::DeliveryId;
use crate::webhooks::{parse_webhook, verify_signature, ParseError};
use crate::worker::TriageJob;

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub's HMAC-SHA256 signature.
const HEADER_SIGNATURE_256: &str = "x-hub-signature-256";
/// Legacy SHA1 signature header, sent by older App configurations.
const HEADER_SIGNATURE_LEGACY: &str = "x-hub-signature";

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// Invalid signature.
    #[error("invalid signature")]
    InvalidSignature,

    /// Malformed payload.
    #[error("malformed payload: {0}")]
    Malformed(#[from] ParseError),

    /// The job queue is full.
    #[error("triage queue is full")]
    QueueFull,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::Malformed(_) => StatusCode::BAD_REQUEST,
            WebhookError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `X-GitHub-Event`: Event type (e.g., "pull_request")
///   - `X-GitHub-Delivery`: Unique delivery ID (UUID format)
///   - `X-Hub-Signature-256`: HMAC-SHA256 signature of the payload
///     (`X-Hub-Signature`, the SHA1 form, is accepted as a fallback)
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 202 Accepted: event enqueued (or deliberately ignored)
/// - 400 Bad Request: missing header or malformed payload
/// - 401 Unauthorized: invalid signature
/// - 503 Service Unavailable: triage queue is full
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let event_type = get_header(&headers, HEADER_EVENT)?;
    let delivery = DeliveryId::new(get_header(&headers, HEADER_DELIVERY)?);
    let signature_header = get_header(&headers, HEADER_SIGNATURE_256)
        .or_else(|_| get_header(&headers, HEADER_SIGNATURE_LEGACY))
        .map_err(|_| WebhookError::MissingHeader(HEADER_SIGNATURE_256))?;

    debug!(delivery = %delivery, event_type = %event_type, "received webhook");

    // Verify before touching the payload. Unsigned requests get no parsing.
    if !verify_signature(&body, &signature_header, app_state.webhook_secret()) {
        warn!(delivery = %delivery, "invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    let Some(event) = parse_webhook(&event_type, &body)? else {
        debug!(delivery = %delivery, event_type = %event_type, "ignoring event type");
        return Ok((StatusCode::ACCEPTED, "Ignored"));
    };

    info!(
        delivery = %delivery,
        repo = %event.repo,
        pr = %event.number,
        action = ?event.action,
        "enqueueing pull request event"
    );

    app_state
        .jobs()
        .try_send(TriageJob { delivery, event })
        .map_err(|_| WebhookError::QueueFull)?;

    Ok((StatusCode::ACCEPTED, "Accepted"))
}

/// Extracts a required header value as a string.
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}
