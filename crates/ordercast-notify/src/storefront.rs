//! Storefront API client: order data enrichment.
//!
//! Webhook envelopes carry only a resource id; handlers enrich the event
//! with a single authenticated GraphQL query against the commerce
//! backend. The [`OrderSource`] trait is the seam handlers depend on, so
//! tests run against stubs and never touch the network.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::NotifyError;

const ORDER_QUERY: &str = r"
query OrderDetails($id: ID!) {
  order(id: $id) {
    id
    displayId
    email
    currencyCode
    total
    paymentStatus
    fulfillmentStatus
  }
}";

/// Supplementary order data fetched from the storefront API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    /// Order identifier, matching the envelope's resource id.
    pub id: String,
    /// Short human-facing order number.
    #[serde(default)]
    pub display_id: Option<i64>,
    /// Customer email address, when the order has one.
    #[serde(default)]
    pub email: Option<String>,
    /// ISO currency code of the order totals.
    #[serde(default)]
    pub currency_code: Option<String>,
    /// Order grand total in minor units.
    #[serde(default)]
    pub total: Option<i64>,
    /// Current payment state as reported by the backend.
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Current fulfillment state as reported by the backend.
    #[serde(default)]
    pub fulfillment_status: Option<String>,
}

/// Source of supplementary order data.
#[async_trait::async_trait]
pub trait OrderSource: Send + Sync + fmt::Debug {
    /// Fetches details for one order.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] on transport failure, a non-success
    /// status, or a response without the requested order.
    async fn fetch_order(&self, resource_id: &str) -> Result<OrderDetails, NotifyError>;
}

/// Configuration for the storefront API client.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// GraphQL endpoint URL.
    pub api_url: String,
    /// Bearer token for authentication.
    pub api_token: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl StorefrontConfig {
    /// Creates a config with the default 10-second timeout.
    pub fn new(api_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self { api_url: api_url.into(), api_token: api_token.into(), timeout: Duration::from_secs(10) }
    }
}

/// GraphQL-over-HTTP implementation of [`OrderSource`].
#[derive(Debug, Clone)]
pub struct HttpOrderSource {
    client: reqwest::Client,
    config: StorefrontConfig,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<OrderData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct OrderData {
    order: Option<OrderDetails>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl HttpOrderSource {
    /// Creates a client for the storefront API.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl OrderSource for HttpOrderSource {
    async fn fetch_order(&self, resource_id: &str) -> Result<OrderDetails, NotifyError> {
        debug!(resource_id, "fetching order details from storefront");

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_token)
            .json(&json!({
                "query": ORDER_QUERY,
                "variables": { "id": resource_id },
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status { service: "storefront", status: status.as_u16() });
        }

        let body: GraphQlResponse = response.json().await?;

        if let Some(first) = body.errors.first() {
            return Err(NotifyError::MissingData {
                service: "storefront",
                detail: first.message.clone(),
            });
        }

        body.data.and_then(|d| d.order).ok_or_else(|| NotifyError::MissingData {
            service: "storefront",
            detail: format!("order {resource_id} not found"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_order_response() {
        let raw = r#"{
            "data": {
                "order": {
                    "id": "order_1",
                    "displayId": 1042,
                    "email": "jon@example.com",
                    "currencyCode": "USD",
                    "total": 59894,
                    "paymentStatus": "captured",
                    "fulfillmentStatus": "shipped"
                }
            }
        }"#;

        let parsed: GraphQlResponse = serde_json::from_str(raw).unwrap();
        let order = parsed.data.unwrap().order.unwrap();

        assert_eq!(order.id, "order_1");
        assert_eq!(order.display_id, Some(1042));
        assert_eq!(order.email.as_deref(), Some("jon@example.com"));
        assert_eq!(order.payment_status.as_deref(), Some("captured"));
    }

    #[test]
    fn parses_partial_order_response() {
        let raw = r#"{"data": {"order": {"id": "order_2"}}}"#;

        let parsed: GraphQlResponse = serde_json::from_str(raw).unwrap();
        let order = parsed.data.unwrap().order.unwrap();

        assert_eq!(order.id, "order_2");
        assert!(order.email.is_none());
        assert!(order.total.is_none());
    }

    #[test]
    fn parses_graphql_errors() {
        let raw = r#"{"errors": [{"message": "order not found"}]}"#;

        let parsed: GraphQlResponse = serde_json::from_str(raw).unwrap();

        assert!(parsed.data.is_none());
        assert_eq!(parsed.errors[0].message, "order not found");
    }

    #[test]
    fn parses_null_order() {
        let raw = r#"{"data": {"order": null}}"#;

        let parsed: GraphQlResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.data.unwrap().order.is_none());
    }
}
