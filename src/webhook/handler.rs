use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use http::HeaderMap;
use serde::Serialize;

use super::events::WebhookEnvelope;
use super::reconcile::WebhookReconciler;
use super::signature::{WebhookHeaders, WebhookVerifier};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct WebhookState {
    verifier: Arc<WebhookVerifier>,
    reconciler: Arc<WebhookReconciler>,
}

impl WebhookState {
    pub fn new(verifier: WebhookVerifier, reconciler: WebhookReconciler) -> Self {
        Self {
            verifier: Arc::new(verifier),
            reconciler: Arc::new(reconciler),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhooks/clerk", post(handle_clerk_webhook))
        .with_state(state)
}

/// Body is taken as raw bytes so the signature is checked against exactly what was sent.
async fn handle_clerk_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    state
        .verifier
        .verify(&WebhookHeaders::from_headers(&headers), &body)?;

    let envelope = WebhookEnvelope::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    tracing::info!("Clerk webhook received: {}", envelope.event_type);

    // Processing failures are logged inside; the sender always sees success.
    state
        .reconciler
        .handle_event(&envelope.event_type, envelope.data)
        .await;

    Ok(Json(WebhookAck { status: "ok" }))
}
