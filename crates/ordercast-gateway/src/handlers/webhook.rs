//! Webhook ingestion endpoint.
//!
//! Captures the raw body bytes before any JSON parsing (signature
//! verification needs the exact bytes as sent), then runs the pipeline
//! and maps its uniform outcome onto the HTTP response.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::{config::FALLBACK_SIGNATURE_HEADER, server::AppState};

/// Response body for webhook deliveries.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the delivery was accepted.
    pub success: bool,
    /// Human-readable note on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Generic error description on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ingests one webhook delivery.
///
/// The signature is read from the configured canonical header; the
/// deprecated fallback header is consulted only when the canonical one is
/// absent, and every such use is logged so the sender can be migrated.
#[instrument(name = "receive_webhook", skip_all, fields(body_len = body.len()))]
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = extract_signature(&headers, &state.signature_header);

    let outcome = state.pipeline.process(&body, signature.as_deref()).await;

    let status =
        StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let response = WebhookResponse {
        success: outcome.success,
        message: outcome.message,
        error: outcome.error,
    };

    (status, Json(response)).into_response()
}

/// Reads the signature header value, canonical name first.
fn extract_signature(headers: &HeaderMap, canonical: &str) -> Option<String> {
    if let Some(value) = headers.get(canonical).and_then(|v| v.to_str().ok()) {
        return Some(value.to_string());
    }

    let fallback = headers.get(FALLBACK_SIGNATURE_HEADER).and_then(|v| v.to_str().ok())?;
    warn!(
        header = FALLBACK_SIGNATURE_HEADER,
        "signature read from deprecated fallback header"
    );
    Some(fallback.to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn extracts_canonical_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Webhook-Signature", HeaderValue::from_static("sha256=abc"));

        let signature = extract_signature(&headers, "X-Webhook-Signature");
        assert_eq!(signature.as_deref(), Some("sha256=abc"));
    }

    #[test]
    fn falls_back_to_deprecated_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Commerce-Signature", HeaderValue::from_static("sha256=def"));

        let signature = extract_signature(&headers, "X-Webhook-Signature");
        assert_eq!(signature.as_deref(), Some("sha256=def"));
    }

    #[test]
    fn canonical_header_wins_over_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Webhook-Signature", HeaderValue::from_static("sha256=abc"));
        headers.insert("X-Commerce-Signature", HeaderValue::from_static("sha256=def"));

        let signature = extract_signature(&headers, "X-Webhook-Signature");
        assert_eq!(signature.as_deref(), Some("sha256=abc"));
    }

    #[test]
    fn absent_headers_yield_none() {
        let headers = HeaderMap::new();
        assert!(extract_signature(&headers, "X-Webhook-Signature").is_none());
    }
}
