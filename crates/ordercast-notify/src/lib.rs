//! Shipped event handlers for Ordercast.
//!
//! Implements the business side of the pipeline: for each actionable
//! order event, fetch supplementary order data from the storefront API
//! and dispatch a customer notification through the mailer. The gateway
//! knows none of this; it sees only the [`ordercast_core::EventHandler`]
//! seam.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod handlers;
pub mod mailer;
pub mod storefront;

pub use error::NotifyError;
pub use handlers::{handler_registry, OrderEventKind, OrderNotificationHandler};
pub use mailer::{HttpMailer, MailerConfig, Notification, NotificationReceipt, Notifier};
pub use storefront::{HttpOrderSource, OrderDetails, OrderSource, StorefrontConfig};
