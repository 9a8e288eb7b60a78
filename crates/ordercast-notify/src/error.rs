//! Error types for outbound collaborator calls.

use thiserror::Error;

/// Failures while fetching order data or dispatching notifications.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport-level HTTP failure (connect, timeout, TLS).
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The collaborator answered with a non-success status.
    #[error("{service} returned status {status}")]
    Status {
        /// Which collaborator failed.
        service: &'static str,
        /// The HTTP status it returned.
        status: u16,
    },

    /// The collaborator's response was missing expected data.
    #[error("missing data in {service} response: {detail}")]
    MissingData {
        /// Which collaborator produced the response.
        service: &'static str,
        /// What was missing.
        detail: String,
    },
}
