//! HTTP request handlers for the Ordercast gateway.
//!
//! Two endpoint groups: webhook ingestion (the only route with real
//! security obligations) and orchestration health probes. Handlers never
//! leak pipeline internals to the caller; every response is the uniform
//! `{success, message?, error?}` shape with the taxonomy's status code.

pub mod health;
pub mod webhook;

pub use health::{health_check, liveness_check, readiness_check};
pub use webhook::receive_webhook;
