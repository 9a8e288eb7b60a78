//! HMAC-SHA256 webhook signature verification.
//!
//! The commerce platform signs deliveries in one of two wire formats,
//! detected by content:
//!
//! - simple: `sha256=<hex>`, the signed message is the raw body;
//! - timestamped: comma-separated `key=value` pairs carrying `t=<unix>`
//!   and `v1=<hex>` (pair order not significant), the signed message is
//!   `<t>.<raw body>`.
//!
//! Verification never panics and never propagates: every malformed header
//! or crypto failure is a plain `false`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Signature computation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// The secret could not be used as an HMAC key.
    #[error("invalid signing secret")]
    InvalidSecret,
}

/// One successfully parsed signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ParsedSignature<'a> {
    /// `sha256=<hex>` over the raw body.
    Simple { digest: &'a str },
    /// `t=<unix>,v1=<hex>` over `<t>.<raw body>`.
    Timestamped { timestamp: &'a str, digest: &'a str },
}

/// Extracts the `t=` component from a timestamped signature header.
///
/// Returns `None` for headers without one, including the simple format.
pub(crate) fn timestamp_component(header: &str) -> Option<&str> {
    header.split(',').find_map(|pair| pair.trim().strip_prefix("t="))
}

fn parse_signature_header(header: &str) -> Option<ParsedSignature<'_>> {
    // Simple format takes priority when both shapes could match.
    if let Some(digest) = header.strip_prefix("sha256=") {
        return Some(ParsedSignature::Simple { digest });
    }

    let timestamp = timestamp_component(header)?;
    let digest = header.split(',').find_map(|pair| pair.trim().strip_prefix("v1="))?;
    Some(ParsedSignature::Timestamped { timestamp, digest })
}

/// Computes the lowercase-hex HMAC-SHA256 of `message` keyed by `secret`.
///
/// Exported so senders in tests and fixtures can construct valid
/// signatures the same way the verifier checks them.
///
/// # Errors
///
/// Returns [`SignatureError::InvalidSecret`] if the secret cannot key the
/// HMAC.
pub fn sign_payload(message: &[u8], secret: &str) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn expected_digest(
    raw_body: &[u8],
    parsed: &ParsedSignature<'_>,
    secret: &str,
) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidSecret)?;

    match parsed {
        ParsedSignature::Simple { .. } => mac.update(raw_body),
        ParsedSignature::Timestamped { timestamp, .. } => {
            mac.update(timestamp.as_bytes());
            mac.update(b".");
            mac.update(raw_body);
        },
    }

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies the signature header over the raw request body.
///
/// Returns `false` for an absent header, an empty secret, an unrecognized
/// header shape, or a digest mismatch. The unrecognized-format case is
/// logged for operability; nothing about the failure reaches the caller
/// beyond the boolean.
pub fn verify_signature(raw_body: &[u8], signature_header: Option<&str>, secret: &str) -> bool {
    let Some(header) = signature_header else {
        return false;
    };

    if header.is_empty() || secret.is_empty() {
        return false;
    }

    let Some(parsed) = parse_signature_header(header) else {
        warn!(header_len = header.len(), "unrecognized signature header format");
        return false;
    };

    let Ok(expected) = expected_digest(raw_body, &parsed, secret) else {
        return false;
    };

    let provided = match parsed {
        ParsedSignature::Simple { digest } | ParsedSignature::Timestamped { digest, .. } => digest,
    };

    constant_time_eq(&expected, provided)
}

/// Constant-time string comparison.
///
/// Length mismatch rejects immediately, which is safe: the length of the
/// expected digest is public. Equal-length inputs are XOR-accumulated
/// over every position regardless of early mismatches, so runtime does
/// not depend on where the inputs first differ.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut acc = 0u8;
    for (lhs, rhs) in a.bytes().zip(b.bytes()) {
        acc |= lhs ^ rhs;
    }

    acc == 0
}
