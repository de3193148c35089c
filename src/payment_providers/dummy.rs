//! Dummy payment provider implementation
//!
//! Checkouts are instantly "paid" without talking to any external service.
//! Useful for testing and development purposes.

use async_trait::async_trait;

use crate::{
    config::DummyConfig,
    db::models::wallets::OrderDBResponse,
    payment_providers::{CheckoutSession, PaymentError, PaymentProvider, PaymentSession, Result, WebhookEvent},
};

/// Dummy payment provider; every checkout succeeds immediately.
pub struct DummyProvider {
    cents_per_credit: i64,
}

impl DummyProvider {
    pub fn new(cents_per_credit: i64) -> Self {
        Self { cents_per_credit }
    }
}

impl From<DummyConfig> for DummyProvider {
    fn from(config: DummyConfig) -> Self {
        Self::new(config.cents_per_credit)
    }
}

#[async_trait]
impl PaymentProvider for DummyProvider {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn cents_per_credit(&self) -> i64 {
        self.cents_per_credit
    }

    fn currency(&self) -> &str {
        "EUR"
    }

    async fn create_checkout(
        &self,
        order: &OrderDBResponse,
        success_url: &str,
        _cancel_url: &str,
    ) -> Result<CheckoutSession> {
        // The "checkout" sends the buyer straight to the success URL; the
        // capture endpoint settles the order like any other provider
        let provider_order_id = format!("dummy_order_{}_{}", order.user_id, order.id);
        let checkout_url = success_url.replace("{ORDER_ID}", &order.id.to_string());

        tracing::info!("Dummy provider created checkout {} for order {}", provider_order_id, order.id);

        Ok(CheckoutSession {
            provider_order_id: Some(provider_order_id),
            checkout_url,
        })
    }

    async fn get_payment_session(&self, _order: &OrderDBResponse) -> Result<PaymentSession> {
        // Dummy checkouts are always paid
        Ok(PaymentSession { is_paid: true })
    }

    async fn validate_webhook(&self, _headers: &axum::http::HeaderMap, body: &str) -> Result<WebhookEvent> {
        // No signature to check: the dummy provider trusts its caller, which
        // is only acceptable for development and tests
        let event: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| PaymentError::InvalidData(format!("Malformed webhook body: {e}")))?;

        let event_type = event["event_type"]
            .as_str()
            .ok_or_else(|| PaymentError::InvalidData("Webhook missing event_type".to_string()))?
            .to_string();

        Ok(WebhookEvent {
            event_type,
            provider_order_id: event["provider_order_id"].as_str().map(str::to_string),
        })
    }
}
