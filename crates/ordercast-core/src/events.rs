//! Handler dispatch for validated webhook events.
//!
//! The dispatcher is a single-level type-to-handler mapping, not a pub/sub
//! bus: exact-string match on the envelope's `type` tag, at most one
//! handler per event. The table is injected at construction so the gateway
//! stays decoupled from business side effects and is testable with stubs.

use std::{collections::HashMap, fmt, sync::Arc};

use tracing::info;

use crate::envelope::WebhookEnvelope;

/// Event type tags the shipped handler set acts on.
///
/// These constants close over the open wire format at the dispatch layer
/// only; decoding accepts any tag.
pub mod event_types {
    /// A new order was placed.
    pub const ORDER_CREATED: &str = "order.created";
    /// An order's payment state changed (e.g. authorized, captured).
    pub const ORDER_PAYMENT_STATE_CHANGED: &str = "order.payment_state.changed";
    /// An order's fulfillment state changed (e.g. shipped, delivered).
    pub const ORDER_FULFILLMENT_STATE_CHANGED: &str = "order.fulfillment_state.changed";
    /// An order was cancelled.
    pub const ORDER_CANCELLED: &str = "order.cancelled";
}

/// Outcome of one dispatch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// A registered handler ran to completion.
    Handled,
    /// No handler is registered for the event type; the event was ignored.
    Unhandled(String),
}

/// Trait for handling one validated webhook event.
///
/// Implementations read the envelope and perform their side effects
/// (fetching supplementary data, sending notifications). They must be safe
/// under concurrent invocation: the gateway provides no per-resource or
/// per-event-type mutual exclusion.
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync + fmt::Debug {
    /// Handles a validated event.
    ///
    /// # Errors
    ///
    /// A returned error propagates to the pipeline, which reports the
    /// generic internal-error outcome to the sender.
    async fn handle(&self, envelope: &WebhookEnvelope) -> anyhow::Result<()>;
}

/// No-op handler that accepts every event and does nothing.
///
/// Useful for tests and for registering event types that should be
/// acknowledged without side effects.
#[derive(Debug, Default)]
pub struct NoOpHandler;

impl NoOpHandler {
    /// Creates a new no-op handler.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl EventHandler for NoOpHandler {
    async fn handle(&self, _envelope: &WebhookEnvelope) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Injected mapping of event type tags to handlers.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { handlers: HashMap::new() }
    }

    /// Registers a handler for an event type, replacing any previous one.
    #[must_use]
    pub fn register(mut self, event_type: impl Into<String>, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.insert(event_type.into(), handler);
        self
    }

    /// Returns whether a handler is registered for the given type.
    pub fn contains(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Returns the number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Routes an envelope to the matching handler.
    ///
    /// Unknown event types are not errors: the sender should not retry
    /// merely because the receiver chose not to act, so they log at info
    /// and yield [`DispatchResult::Unhandled`].
    ///
    /// # Errors
    ///
    /// Propagates the handler's failure unchanged; the dispatcher adds no
    /// retry or isolation logic of its own.
    pub async fn dispatch(&self, envelope: &WebhookEnvelope) -> anyhow::Result<DispatchResult> {
        let Some(handler) = self.handlers.get(&envelope.event_type) else {
            info!(
                event_id = %envelope.id,
                event_type = %envelope.event_type,
                "no handler registered, ignoring event"
            );
            return Ok(DispatchResult::Unhandled(envelope.event_type.clone()));
        };

        handler.handle(envelope).await?;
        Ok(DispatchResult::Handled)
    }
}
