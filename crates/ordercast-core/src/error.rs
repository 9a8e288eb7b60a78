//! Error taxonomy for the webhook ingestion pipeline.
//!
//! Four failure kinds cover every way a request can go wrong, each with a
//! stable code and an HTTP status. Messages sent to the caller stay
//! generic: a 401 never says whether the signature or the timestamp was at
//! fault, and a 400 never echoes attacker-controlled payload content.
//! Full detail is logged server-side only.

use thiserror::Error;

use crate::envelope::DecodeError;

/// Result type alias using [`GatewayError`].
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Pipeline error taxonomy with codes matching the error table.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Required signing secret is not configured (E1001).
    ///
    /// An operational misconfiguration, not a client fault; surfaced as
    /// 500 so the sender retries once the deployment is fixed.
    #[error("[E1001] configuration error: {0}")]
    Config(String),

    /// Signature or freshness check failed (E1002).
    #[error("[E1002] unauthorized webhook delivery")]
    Auth,

    /// Body was malformed or failed schema validation (E1003).
    #[error("[E1003] invalid payload")]
    Decode(#[from] DecodeError),

    /// A dispatched handler failed (E1004).
    #[error("[E1004] handler failure")]
    Handler(#[source] anyhow::Error),
}

impl GatewayError {
    /// Returns the stable error code (E1001-E1004).
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "E1001",
            Self::Auth => "E1002",
            Self::Decode(_) => "E1003",
            Self::Handler(_) => "E1004",
        }
    }

    /// Returns the HTTP status this error maps to at the boundary.
    pub const fn status(&self) -> u16 {
        match self {
            Self::Config(_) | Self::Handler(_) => 500,
            Self::Auth => 401,
            Self::Decode(_) => 400,
        }
    }

    /// Returns the generic, caller-safe message for this error.
    ///
    /// Deliberately coarse: no hint of which auth check failed, no echo of
    /// payload content.
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::Config(_) => "service misconfigured",
            Self::Auth => "unauthorized",
            Self::Decode(_) => "invalid payload",
            Self::Handler(_) => "internal error",
        }
    }
}
