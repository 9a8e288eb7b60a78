//! The webhook ingestion pipeline.
//!
//! One run per inbound request, terminal on first failure:
//! secret present, signature valid, timestamp fresh, body decodes,
//! handler dispatched. Every path collapses into a uniform
//! [`PipelineOutcome`] so no error ever escapes to the HTTP boundary
//! uncaught. The pipeline holds no state across requests and is safely
//! re-entrant.

use ordercast_core::{decode_envelope, DispatchResult, GatewayError, HandlerRegistry};
use tracing::{debug, error, info, instrument, warn};

use crate::{crypto::verify_signature, replay::ReplayGuard};

/// Uniform result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Whether the request was accepted.
    pub success: bool,
    /// HTTP status code for the response.
    pub status: u16,
    /// Caller-facing message on success.
    pub message: Option<String>,
    /// Caller-facing generic error description on failure.
    pub error: Option<String>,
}

impl PipelineOutcome {
    fn accepted(message: impl Into<String>) -> Self {
        Self { success: true, status: 200, message: Some(message.into()), error: None }
    }

    fn rejected(err: &GatewayError) -> Self {
        Self {
            success: false,
            status: err.status(),
            message: None,
            error: Some(err.public_message().to_string()),
        }
    }
}

/// Orchestrates verification, replay guarding, decoding, and dispatch.
#[derive(Debug)]
pub struct WebhookPipeline {
    secret: Option<String>,
    replay: ReplayGuard,
    registry: HandlerRegistry,
}

impl WebhookPipeline {
    /// Creates a pipeline.
    ///
    /// `secret` is optional here so a misconfigured deployment fails
    /// closed per request (500) instead of at startup; the binary decides
    /// whether to refuse to boot instead.
    pub fn new(secret: Option<String>, replay: ReplayGuard, registry: HandlerRegistry) -> Self {
        Self { secret, replay, registry }
    }

    /// Runs one inbound request through the pipeline.
    ///
    /// Never returns an error: every failure kind is converted into the
    /// uniform outcome with its taxonomy status. The 401 path does not
    /// reveal whether the signature or the timestamp was at fault; that
    /// distinction exists only in the server-side log.
    #[instrument(name = "webhook_pipeline", skip_all, fields(body_len = raw_body.len()))]
    pub async fn process(&self, raw_body: &[u8], signature_header: Option<&str>) -> PipelineOutcome {
        let Some(secret) = self.secret.as_deref() else {
            let err = GatewayError::Config("webhook signing secret is not configured".into());
            error!(code = err.code(), "rejecting delivery: no signing secret configured");
            return PipelineOutcome::rejected(&err);
        };

        if !verify_signature(raw_body, signature_header, secret) {
            warn!(code = GatewayError::Auth.code(), "signature verification failed");
            return PipelineOutcome::rejected(&GatewayError::Auth);
        }

        if !self.replay.is_fresh(signature_header) {
            warn!(code = GatewayError::Auth.code(), "embedded timestamp outside tolerance window");
            return PipelineOutcome::rejected(&GatewayError::Auth);
        }

        let envelope = match decode_envelope(raw_body) {
            Ok(envelope) => envelope,
            Err(e) => {
                let err = GatewayError::Decode(e);
                warn!(code = err.code(), detail = %err, "payload failed decoding");
                return PipelineOutcome::rejected(&err);
            },
        };

        debug!(
            event_id = %envelope.id,
            event_type = %envelope.event_type,
            resource_id = %envelope.data.object.resource_id,
            "envelope decoded"
        );

        match self.registry.dispatch(&envelope).await {
            Ok(DispatchResult::Handled) => {
                info!(event_id = %envelope.id, event_type = %envelope.event_type, "event handled");
                PipelineOutcome::accepted("event processed")
            },
            Ok(DispatchResult::Unhandled(event_type)) => {
                // Not a failure: the sender should not retry because the
                // receiver chose not to act on this type.
                PipelineOutcome::accepted(format!("event type {event_type} ignored"))
            },
            Err(e) => {
                let err = GatewayError::Handler(e);
                error!(
                    code = err.code(),
                    event_id = %envelope.id,
                    event_type = %envelope.event_type,
                    detail = ?err,
                    "handler failed"
                );
                PipelineOutcome::rejected(&err)
            },
        }
    }
}
