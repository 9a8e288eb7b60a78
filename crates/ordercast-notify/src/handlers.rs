//! Order event handlers.
//!
//! One handler type covers the four actionable order events; the kind
//! selects the notification wording. Every handler run is independent:
//! it fetches the order and then dispatches one notification. Orders
//! without a customer email are logged and skipped rather than failed,
//! since a retry from the sender cannot conjure an address.

use std::sync::Arc;

use ordercast_core::{event_types, EventHandler, HandlerRegistry, WebhookEnvelope};
use tracing::{info, warn};

use crate::{
    mailer::{Notification, Notifier},
    storefront::{OrderDetails, OrderSource},
};

/// Which order event a handler instance reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEventKind {
    /// `order.created`
    Created,
    /// `order.payment_state.changed`
    PaymentStateChanged,
    /// `order.fulfillment_state.changed`
    FulfillmentStateChanged,
    /// `order.cancelled`
    Cancelled,
}

impl OrderEventKind {
    const fn event_type(self) -> &'static str {
        match self {
            Self::Created => event_types::ORDER_CREATED,
            Self::PaymentStateChanged => event_types::ORDER_PAYMENT_STATE_CHANGED,
            Self::FulfillmentStateChanged => event_types::ORDER_FULFILLMENT_STATE_CHANGED,
            Self::Cancelled => event_types::ORDER_CANCELLED,
        }
    }
}

/// Handler that enriches an order event and notifies the customer.
#[derive(Debug)]
pub struct OrderNotificationHandler {
    kind: OrderEventKind,
    source: Arc<dyn OrderSource>,
    notifier: Arc<dyn Notifier>,
}

impl OrderNotificationHandler {
    /// Creates a handler for one event kind.
    pub fn new(
        kind: OrderEventKind,
        source: Arc<dyn OrderSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { kind, source, notifier }
    }

    fn order_label(order: &OrderDetails) -> String {
        order.display_id.map_or_else(|| order.id.clone(), |n| format!("#{n}"))
    }

    fn subject(&self, order: &OrderDetails) -> String {
        let label = Self::order_label(order);
        match self.kind {
            OrderEventKind::Created => format!("Order {label} confirmed"),
            OrderEventKind::PaymentStateChanged => format!("Payment update for order {label}"),
            OrderEventKind::FulfillmentStateChanged => format!("Shipping update for order {label}"),
            OrderEventKind::Cancelled => format!("Order {label} cancelled"),
        }
    }

    fn body(&self, order: &OrderDetails) -> String {
        let label = Self::order_label(order);
        match self.kind {
            OrderEventKind::Created => {
                format!("Thanks for your purchase. Your order {label} has been received.")
            },
            OrderEventKind::PaymentStateChanged => {
                let state = order.payment_status.as_deref().unwrap_or("updated");
                format!("The payment for your order {label} is now {state}.")
            },
            OrderEventKind::FulfillmentStateChanged => {
                let state = order.fulfillment_status.as_deref().unwrap_or("updated");
                format!("Your order {label} is now {state}.")
            },
            OrderEventKind::Cancelled => {
                format!("Your order {label} has been cancelled. Any captured payment will be refunded.")
            },
        }
    }
}

#[async_trait::async_trait]
impl EventHandler for OrderNotificationHandler {
    async fn handle(&self, envelope: &WebhookEnvelope) -> anyhow::Result<()> {
        let resource_id = &envelope.data.object.resource_id;
        let order = self.source.fetch_order(resource_id).await?;

        let Some(email) = order.email.clone() else {
            warn!(
                event_id = %envelope.id,
                order_id = %order.id,
                "order has no customer email, skipping notification"
            );
            return Ok(());
        };

        let notification =
            Notification { to: email, subject: self.subject(&order), text: self.body(&order) };

        let receipt = self.notifier.dispatch(&notification).await?;
        info!(
            event_id = %envelope.id,
            order_id = %order.id,
            message_id = receipt.message_id.as_deref().unwrap_or("none"),
            "notification dispatched"
        );

        Ok(())
    }
}

/// Builds the shipped handler table: all four order event types wired to
/// the given collaborators.
pub fn handler_registry(
    source: Arc<dyn OrderSource>,
    notifier: Arc<dyn Notifier>,
) -> HandlerRegistry {
    let kinds = [
        OrderEventKind::Created,
        OrderEventKind::PaymentStateChanged,
        OrderEventKind::FulfillmentStateChanged,
        OrderEventKind::Cancelled,
    ];

    kinds.into_iter().fold(HandlerRegistry::new(), |registry, kind| {
        registry.register(
            kind.event_type(),
            Arc::new(OrderNotificationHandler::new(kind, source.clone(), notifier.clone())),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use ordercast_core::decode_envelope;

    use super::*;
    use crate::{error::NotifyError, mailer::NotificationReceipt};

    #[derive(Debug)]
    struct StubOrderSource {
        order: Option<OrderDetails>,
    }

    #[async_trait::async_trait]
    impl OrderSource for StubOrderSource {
        async fn fetch_order(&self, resource_id: &str) -> Result<OrderDetails, NotifyError> {
            self.order.clone().ok_or_else(|| NotifyError::MissingData {
                service: "storefront",
                detail: format!("order {resource_id} not found"),
            })
        }
    }

    #[derive(Debug, Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn dispatch(
            &self,
            notification: &Notification,
        ) -> Result<NotificationReceipt, NotifyError> {
            self.sent.lock().unwrap().push(notification.clone());
            Ok(NotificationReceipt { message_id: Some("msg_1".into()) })
        }
    }

    fn order() -> OrderDetails {
        OrderDetails {
            id: "order_1".into(),
            display_id: Some(1042),
            email: Some("jon@example.com".into()),
            currency_code: Some("USD".into()),
            total: Some(59_894),
            payment_status: Some("captured".into()),
            fulfillment_status: Some("shipped".into()),
        }
    }

    fn envelope(event_type: &str) -> ordercast_core::WebhookEnvelope {
        let body = format!(
            r#"{{
                "id": "whr_1",
                "object": "event",
                "created": 1700000000,
                "idempotency_key": "11111111-1111-1111-1111-111111111111",
                "data": {{"object": {{"id": "order_1"}}}},
                "type": "{event_type}"
            }}"#
        );
        decode_envelope(body.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn created_handler_notifies_customer() {
        let notifier = Arc::new(RecordingNotifier::default());
        let handler = OrderNotificationHandler::new(
            OrderEventKind::Created,
            Arc::new(StubOrderSource { order: Some(order()) }),
            notifier.clone(),
        );

        handler.handle(&envelope("order.created")).await.unwrap();

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jon@example.com");
        assert_eq!(sent[0].subject, "Order #1042 confirmed");
    }

    #[tokio::test]
    async fn payment_handler_includes_fetched_state() {
        let notifier = Arc::new(RecordingNotifier::default());
        let handler = OrderNotificationHandler::new(
            OrderEventKind::PaymentStateChanged,
            Arc::new(StubOrderSource { order: Some(order()) }),
            notifier.clone(),
        );

        handler.handle(&envelope("order.payment_state.changed")).await.unwrap();

        let sent = notifier.sent.lock().unwrap();
        assert!(sent[0].text.contains("captured"));
    }

    #[tokio::test]
    async fn missing_email_skips_without_error() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut anonymous = order();
        anonymous.email = None;

        let handler = OrderNotificationHandler::new(
            OrderEventKind::Cancelled,
            Arc::new(StubOrderSource { order: Some(anonymous) }),
            notifier.clone(),
        );

        handler.handle(&envelope("order.cancelled")).await.unwrap();

        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_propagates() {
        let handler = OrderNotificationHandler::new(
            OrderEventKind::Created,
            Arc::new(StubOrderSource { order: None }),
            Arc::new(RecordingNotifier::default()),
        );

        let err = handler.handle(&envelope("order.created")).await.unwrap_err();
        assert!(err.to_string().contains("order_1"));
    }

    #[tokio::test]
    async fn registry_covers_all_four_event_types() {
        let registry = handler_registry(
            Arc::new(StubOrderSource { order: Some(order()) }),
            Arc::new(RecordingNotifier::default()),
        );

        assert_eq!(registry.len(), 4);
        for event_type in [
            event_types::ORDER_CREATED,
            event_types::ORDER_PAYMENT_STATE_CHANGED,
            event_types::ORDER_FULFILLMENT_STATE_CHANGED,
            event_types::ORDER_CANCELLED,
        ] {
            assert!(registry.contains(event_type), "missing handler for {event_type}");
        }
    }
}
