//! Webhook event envelope and schema-validating decode.
//!
//! The commerce platform delivers events as a JSON envelope carrying an
//! open-ended `type` tag and a nested subject under `data.object`. The
//! schema is permissive on purpose: unknown fields at the top level and
//! inside the subject are preserved verbatim so upstream schema evolution
//! never breaks decoding. Only dispatch decides which types it acts on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Literal value of the `object` discriminator on every event envelope.
pub const EVENT_OBJECT_TAG: &str = "event";

/// Errors produced while decoding a raw webhook body.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body is not well-formed JSON.
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The body parsed but violates the envelope schema.
    #[error("schema violation: {0}")]
    Schema(String),
}

/// A validated webhook delivery.
///
/// Immutable once decoded; handlers receive a shared reference and never
/// mutate it. Wire field names differ from the Rust names where noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    /// Opaque delivery identifier, unique per delivery attempt.
    pub id: String,

    /// Schema discriminator; always `"event"` on valid envelopes.
    pub object: String,

    /// Unix timestamp (seconds) when the source system emitted the event.
    #[serde(rename = "created")]
    pub created_at: i64,

    /// UUID shared by redeliveries of the same logical occurrence.
    ///
    /// Consumers dedupe on this key; the gateway itself keeps no store and
    /// therefore does not.
    pub idempotency_key: String,

    /// Dot-namespaced event tag, e.g. `order.created`.
    ///
    /// Open-ended on the wire: the schema accepts any string and the
    /// closed set of actionable types lives only in the handler table.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event payload wrapper.
    pub data: EventData,

    /// Top-level fields this version of the schema does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wrapper around the event subject, mirroring the wire's `data` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    /// The resource the event is about.
    pub object: EventSubject,

    /// Unrecognized fields alongside `object`, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The resource an event refers to.
///
/// Only the resource id is required; everything else the platform sends
/// (state fields, totals, customer info) rides along untyped so handlers
/// can inspect it without the schema having to enumerate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSubject {
    /// Identifier of the referenced resource, e.g. an order id.
    #[serde(rename = "id")]
    pub resource_id: String,

    /// Unrecognized subject fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WebhookEnvelope {
    fn validate(&self) -> Result<(), DecodeError> {
        if self.object != EVENT_OBJECT_TAG {
            return Err(DecodeError::Schema(format!(
                "object discriminator must be \"{EVENT_OBJECT_TAG}\", got \"{}\"",
                self.object
            )));
        }
        if self.id.is_empty() {
            return Err(DecodeError::Schema("id must be non-empty".into()));
        }
        if self.idempotency_key.is_empty() {
            return Err(DecodeError::Schema("idempotency_key must be non-empty".into()));
        }
        if self.event_type.is_empty() {
            return Err(DecodeError::Schema("type must be non-empty".into()));
        }
        if self.data.object.resource_id.is_empty() {
            return Err(DecodeError::Schema("data.object.id must be non-empty".into()));
        }
        Ok(())
    }
}

/// Decodes and schema-validates a raw webhook body.
///
/// Syntax errors and schema errors are reported as distinct variants:
/// a body that is not JSON at all yields [`DecodeError::Json`], while a
/// parsed body with a missing field, wrong type, or wrong `object`
/// literal yields [`DecodeError::Schema`].
///
/// # Errors
///
/// Returns [`DecodeError`] when the body is malformed or violates the
/// envelope schema.
pub fn decode_envelope(raw_body: &[u8]) -> Result<WebhookEnvelope, DecodeError> {
    let envelope: WebhookEnvelope = serde_json::from_slice(raw_body).map_err(|e| {
        if e.classify() == serde_json::error::Category::Data {
            DecodeError::Schema(e.to_string())
        } else {
            DecodeError::Json(e)
        }
    })?;

    envelope.validate()?;
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_BODY: &str = r#"{
        "id": "whr_1",
        "object": "event",
        "created": 1700000000,
        "idempotency_key": "11111111-1111-1111-1111-111111111111",
        "data": {"object": {"id": "order_1"}},
        "type": "order.created"
    }"#;

    #[test]
    fn decodes_valid_envelope() {
        let envelope = decode_envelope(VALID_BODY.as_bytes()).unwrap();

        assert_eq!(envelope.id, "whr_1");
        assert_eq!(envelope.created_at, 1_700_000_000);
        assert_eq!(envelope.event_type, "order.created");
        assert_eq!(envelope.data.object.resource_id, "order_1");
    }

    #[test]
    fn rejects_malformed_json() {
        let err = decode_envelope(b"{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn rejects_missing_idempotency_key() {
        let body = r#"{
            "id": "whr_1",
            "object": "event",
            "created": 1700000000,
            "data": {"object": {"id": "order_1"}},
            "type": "order.created"
        }"#;

        let err = decode_envelope(body.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::Schema(_)));
    }

    #[test]
    fn rejects_wrong_object_literal() {
        let body = VALID_BODY.replace("\"event\"", "\"charge\"");
        let err = decode_envelope(body.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::Schema(_)));
    }

    #[test]
    fn rejects_non_integer_created() {
        let body = VALID_BODY.replace("1700000000", "\"soon\"");
        let err = decode_envelope(body.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::Schema(_)));
    }

    #[test]
    fn rejects_empty_resource_id() {
        let body = VALID_BODY.replace("order_1", "");
        let err = decode_envelope(body.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::Schema(_)));
    }

    #[test]
    fn preserves_unknown_subject_fields() {
        let body = r#"{
            "id": "whr_2",
            "object": "event",
            "created": 1700000000,
            "idempotency_key": "22222222-2222-2222-2222-222222222222",
            "data": {"object": {"id": "order_2", "fulfillment_status": "shipped"}},
            "type": "order.fulfillment_state.changed"
        }"#;

        let envelope = decode_envelope(body.as_bytes()).unwrap();

        assert_eq!(
            envelope.data.object.extra.get("fulfillment_status"),
            Some(&Value::String("shipped".into()))
        );
    }

    #[test]
    fn preserves_unknown_top_level_fields() {
        let body = VALID_BODY.replacen(
            "\"id\": \"whr_1\",",
            "\"id\": \"whr_1\", \"api_version\": \"2024-01\",",
            1,
        );

        let envelope = decode_envelope(body.as_bytes()).unwrap();

        assert_eq!(envelope.extra.get("api_version"), Some(&Value::String("2024-01".into())));
    }

    #[test]
    fn accepts_open_ended_event_types() {
        let body = VALID_BODY.replace("order.created", "inventory.restocked");
        let envelope = decode_envelope(body.as_bytes()).unwrap();
        assert_eq!(envelope.event_type, "inventory.restocked");
    }

    #[test]
    fn round_trips_through_serde() {
        let envelope = decode_envelope(VALID_BODY.as_bytes()).unwrap();
        let reencoded = serde_json::to_vec(&envelope).unwrap();
        let decoded = decode_envelope(&reencoded).unwrap();
        assert_eq!(envelope, decoded);
    }
}
