//! Health check handlers for service monitoring.
//!
//! Liveness, readiness, and health endpoints for orchestration systems
//! like Kubernetes. The gateway has no backing store, so all three are
//! cheap in-process checks.

use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status.
    pub status: HealthStatus,
    /// Timestamp when the health check was performed.
    pub timestamp: DateTime<Utc>,
    /// Service version information.
    pub version: String,
}

/// Overall health status enumeration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational.
    Healthy,
}

/// Primary health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness probe: the process can accept traffic once it is up.
pub async fn readiness_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Liveness probe.
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
