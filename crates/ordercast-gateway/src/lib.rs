//! Ordercast ingestion gateway.
//!
//! Hosts the webhook verification pipeline behind an axum HTTP boundary:
//! signature verification, replay guarding, envelope decoding, and
//! dispatch to the injected handler table.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod crypto;
pub mod handlers;
pub mod pipeline;
pub mod replay;
pub mod server;

pub use config::Config;
pub use pipeline::{PipelineOutcome, WebhookPipeline};
pub use replay::{ReplayGuard, ReplayPolicy};
pub use server::{create_router, start_server, AppState};
