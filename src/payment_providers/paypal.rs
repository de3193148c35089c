//! PayPal payment provider implementation
//!
//! Uses the PayPal Orders v2 REST API over `reqwest`: client-credentials
//! OAuth, order creation with an approval link, and capture on settlement.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    config::PaypalConfig,
    db::models::wallets::OrderDBResponse,
    payment_providers::{CheckoutSession, PaymentError, PaymentProvider, PaymentSession, Result, WebhookEvent},
};

/// Header names PayPal signs every webhook delivery with.
const TRANSMISSION_HEADERS: [&str; 5] = [
    "paypal-transmission-id",
    "paypal-transmission-time",
    "paypal-transmission-sig",
    "paypal-cert-url",
    "paypal-auth-algo",
];

/// PayPal payment provider
pub struct PaypalProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    webhook_id: Option<String>,
    api_base: String,
    cents_per_credit: i64,
    currency: String,
}

impl PaypalProvider {
    pub fn new(config: PaypalConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.client_id,
            client_secret: config.client_secret,
            webhook_id: config.webhook_id,
            api_base: config.api_base,
            cents_per_credit: config.cents_per_credit,
            currency: config.currency,
        }
    }

    /// Fetch a short-lived OAuth access token.
    async fn access_token(&self) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.api_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| PaymentError::ProviderApi(format!("oauth request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PaymentError::ProviderApi(format!(
                "oauth returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PaymentError::ProviderApi(format!("oauth response malformed: {e}")))?;

        body["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| PaymentError::ProviderApi("oauth response missing access_token".to_string()))
    }

    /// Format an amount in minor units as PayPal's decimal string.
    fn format_amount(cents: i64) -> String {
        format!("{}.{:02}", cents / 100, cents % 100)
    }

    /// Pull the capture event's type and order id out of a verified event.
    fn parse_event(event: &Value) -> Result<WebhookEvent> {
        let event_type = event["event_type"]
            .as_str()
            .ok_or_else(|| PaymentError::InvalidData("Webhook missing event_type".to_string()))?
            .to_string();

        // Capture events carry the order id under the related resource
        let provider_order_id = event["resource"]["supplementary_data"]["related_ids"]["order_id"]
            .as_str()
            .or_else(|| event["resource"]["id"].as_str())
            .map(str::to_string);

        Ok(WebhookEvent {
            event_type,
            provider_order_id,
        })
    }
}

fn required_header<'h>(headers: &'h axum::http::HeaderMap, name: &str) -> Result<&'h str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| PaymentError::InvalidData(format!("Missing {name} header")))
}

impl From<PaypalConfig> for PaypalProvider {
    fn from(config: PaypalConfig) -> Self {
        Self::new(config)
    }
}

#[async_trait]
impl PaymentProvider for PaypalProvider {
    fn name(&self) -> &'static str {
        "paypal"
    }

    fn cents_per_credit(&self) -> i64 {
        self.cents_per_credit
    }

    fn currency(&self) -> &str {
        &self.currency
    }

    async fn create_checkout(
        &self,
        order: &OrderDBResponse,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession> {
        let token = self.access_token().await?;

        let payload = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": order.id.to_string(),
                "amount": {
                    "currency_code": order.currency,
                    "value": Self::format_amount(order.amount_cents),
                },
            }],
            "application_context": {
                "return_url": success_url,
                "cancel_url": cancel_url,
            },
        });

        let response = self
            .client
            .post(format!("{}/v2/checkout/orders", self.api_base))
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PaymentError::ProviderApi(format!("order creation failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PaymentError::ProviderApi(format!(
                "order creation returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PaymentError::ProviderApi(format!("order response malformed: {e}")))?;

        let provider_order_id = body["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| PaymentError::ProviderApi("order response missing id".to_string()))?;

        let checkout_url = body["links"]
            .as_array()
            .and_then(|links| {
                links
                    .iter()
                    .find(|link| link["rel"].as_str() == Some("approve"))
                    .and_then(|link| link["href"].as_str())
            })
            .map(str::to_string)
            .ok_or_else(|| PaymentError::ProviderApi("order response missing approve link".to_string()))?;

        tracing::info!("Created PayPal order {} for order {}", provider_order_id, order.id);

        Ok(CheckoutSession {
            provider_order_id: Some(provider_order_id),
            checkout_url,
        })
    }

    async fn get_payment_session(&self, order: &OrderDBResponse) -> Result<PaymentSession> {
        let provider_order_id = order
            .provider_order_id
            .as_deref()
            .ok_or_else(|| PaymentError::InvalidData("Order has no PayPal order id".to_string()))?;

        let token = self.access_token().await?;

        // Capture is idempotent on PayPal's side; an already-captured order
        // returns 422 ORDER_ALREADY_CAPTURED, which also means "paid"
        let response = self
            .client
            .post(format!("{}/v2/checkout/orders/{}/capture", self.api_base, provider_order_id))
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| PaymentError::ProviderApi(format!("capture failed: {e}")))?;

        if response.status() == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let body: Value = response
                .json()
                .await
                .map_err(|e| PaymentError::ProviderApi(format!("capture response malformed: {e}")))?;
            let already_captured = body["details"]
                .as_array()
                .is_some_and(|details| details.iter().any(|d| d["issue"].as_str() == Some("ORDER_ALREADY_CAPTURED")));
            if already_captured {
                return Ok(PaymentSession { is_paid: true });
            }
            return Ok(PaymentSession { is_paid: false });
        }

        if !response.status().is_success() {
            return Err(PaymentError::ProviderApi(format!("capture returned {}", response.status())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PaymentError::ProviderApi(format!("capture response malformed: {e}")))?;

        Ok(PaymentSession {
            is_paid: body["status"].as_str() == Some("COMPLETED"),
        })
    }

    /// Verify the delivery's signature with PayPal before trusting anything
    /// in the body. The webhook credits wallets, so an event is only
    /// accepted once `/v1/notifications/verify-webhook-signature` confirms
    /// PayPal signed it for our registered webhook.
    async fn validate_webhook(&self, headers: &axum::http::HeaderMap, body: &str) -> Result<WebhookEvent> {
        let [transmission_id, transmission_time, transmission_sig, cert_url, auth_algo] = TRANSMISSION_HEADERS;
        let transmission_id = required_header(headers, transmission_id)?;
        let transmission_time = required_header(headers, transmission_time)?;
        let transmission_sig = required_header(headers, transmission_sig)?;
        let cert_url = required_header(headers, cert_url)?;
        let auth_algo = required_header(headers, auth_algo)?;

        let Some(webhook_id) = self.webhook_id.as_deref() else {
            tracing::warn!("PayPal webhook received but payment.paypal.webhook_id is not configured");
            return Err(PaymentError::InvalidData("Webhook verification is not configured".to_string()));
        };

        let event: Value =
            serde_json::from_str(body).map_err(|e| PaymentError::InvalidData(format!("Malformed webhook body: {e}")))?;

        let token = self.access_token().await?;
        let payload = json!({
            "transmission_id": transmission_id,
            "transmission_time": transmission_time,
            "transmission_sig": transmission_sig,
            "cert_url": cert_url,
            "auth_algo": auth_algo,
            "webhook_id": webhook_id,
            "webhook_event": event,
        });

        let response = self
            .client
            .post(format!("{}/v1/notifications/verify-webhook-signature", self.api_base))
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PaymentError::ProviderApi(format!("webhook verification failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PaymentError::ProviderApi(format!(
                "webhook verification returned {}",
                response.status()
            )));
        }

        let verdict: Value = response
            .json()
            .await
            .map_err(|e| PaymentError::ProviderApi(format!("webhook verification response malformed: {e}")))?;

        if verdict["verification_status"].as_str() != Some("SUCCESS") {
            tracing::warn!("PayPal rejected a webhook signature");
            return Err(PaymentError::InvalidData("Webhook signature verification failed".to_string()));
        }

        Self::parse_event(&event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(webhook_id: Option<&str>) -> PaypalProvider {
        // Mirror main(): reqwest clients need a process-wide rustls crypto provider
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        PaypalProvider::new(PaypalConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            webhook_id: webhook_id.map(str::to_string),
            api_base: "https://api-m.sandbox.paypal.com".to_string(),
            cents_per_credit: 100,
            currency: "EUR".to_string(),
        })
    }

    fn signed_headers() -> axum::http::HeaderMap {
        let mut headers = axum::http::HeaderMap::new();
        for name in TRANSMISSION_HEADERS {
            headers.insert(name, "value".parse().unwrap());
        }
        headers
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(PaypalProvider::format_amount(0), "0.00");
        assert_eq!(PaypalProvider::format_amount(5), "0.05");
        assert_eq!(PaypalProvider::format_amount(1999), "19.99");
        assert_eq!(PaypalProvider::format_amount(10000), "100.00");
    }

    #[tokio::test]
    async fn test_webhook_requires_all_transmission_headers() {
        // An id alone is not a signature
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("paypal-transmission-id", "abc-123".parse().unwrap());

        let result = provider(Some("wh-1")).validate_webhook(&headers, "{}").await;
        assert!(matches!(result, Err(PaymentError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_webhook_rejected_without_configured_webhook_id() {
        // Fully-headed delivery, but nothing to verify against
        let result = provider(None).validate_webhook(&signed_headers(), "{}").await;
        assert!(matches!(result, Err(PaymentError::InvalidData(_))));
    }

    #[test]
    fn test_parse_event_extracts_order_id() {
        let event = serde_json::json!({
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "resource": {
                "id": "capture-1",
                "supplementary_data": {"related_ids": {"order_id": "5O190127TN364715T"}},
            },
        });

        let parsed = PaypalProvider::parse_event(&event).unwrap();
        assert_eq!(parsed.event_type, "PAYMENT.CAPTURE.COMPLETED");
        assert_eq!(parsed.provider_order_id.as_deref(), Some("5O190127TN364715T"));
    }
}
