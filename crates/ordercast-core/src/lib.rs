//! Core domain types for the Ordercast webhook gateway.
//!
//! Provides the validated event envelope, the handler dispatch seam, the
//! error taxonomy, and a clock abstraction. All other crates depend on
//! these foundational types for type safety and consistency.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod error;
pub mod events;
pub mod time;

pub use envelope::{decode_envelope, DecodeError, EventData, EventSubject, WebhookEnvelope};
pub use error::{GatewayError, Result};
pub use events::{event_types, DispatchResult, EventHandler, HandlerRegistry, NoOpHandler};
pub use time::{Clock, RealClock, TestClock};
