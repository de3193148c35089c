//! Payment provider abstraction layer
//!
//! This module defines the `PaymentProvider` trait which abstracts payment
//! processing across providers (PayPal, the dummy test provider). Providers
//! deal only with the external checkout; crediting the wallet happens in
//! [`fulfill_order`], shared by the capture endpoint and the webhook.

use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    config::PaymentConfig,
    db::{
        errors::DbError,
        handlers::Wallets,
        models::wallets::{OrderDBResponse, TransactionCreateDBRequest, TransactionKind},
    },
    types::OrderId,
};

pub mod dummy;
pub mod paypal;

/// Create a payment provider from configuration
///
/// This is the single point where we convert config into provider instances.
/// Adding a new provider requires adding a match arm here.
pub fn create_provider(config: PaymentConfig) -> Arc<dyn PaymentProvider> {
    match config {
        PaymentConfig::Paypal(paypal_config) => Arc::new(paypal::PaypalProvider::from(paypal_config)),
        PaymentConfig::Dummy(dummy_config) => Arc::new(dummy::DummyProvider::from(dummy_config)),
    }
}

/// Result type for payment provider operations
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors that can occur during payment processing
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider API error: {0}")]
    ProviderApi(String),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Payment not completed yet")]
    PaymentNotCompleted,

    #[error("Invalid payment data: {0}")]
    InvalidData(String),

    #[error("Payment already processed")]
    AlreadyProcessed,
}

impl From<PaymentError> for crate::errors::Error {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::PaymentNotCompleted => crate::errors::Error::BadRequest {
                message: "Payment has not been completed".to_string(),
            },
            PaymentError::InvalidData(message) => crate::errors::Error::BadRequest { message },
            PaymentError::AlreadyProcessed => crate::errors::Error::Conflict {
                message: "Payment already processed".to_string(),
            },
            PaymentError::Database(db) => crate::errors::Error::Database(db),
            PaymentError::ProviderApi(detail) => crate::errors::Error::Internal {
                operation: format!("payment provider call: {detail}"),
            },
        }
    }
}

/// The provider side of a freshly created checkout.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Provider-assigned order/session ID, stored on our order for webhooks
    pub provider_order_id: Option<String>,
    /// Where to send the buyer to complete payment
    pub checkout_url: String,
}

/// Settled state of a checkout as seen by the provider.
#[derive(Debug, Clone)]
pub struct PaymentSession {
    pub is_paid: bool,
}

/// A validated webhook event from a payment provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    /// Provider event type, e.g. "PAYMENT.CAPTURE.COMPLETED"
    pub event_type: String,
    /// Provider order ID the event refers to, if applicable
    pub provider_order_id: Option<String>,
}

/// Abstract payment provider interface
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Provider name as stored on orders, e.g. "paypal"
    fn name(&self) -> &'static str;

    /// Price of one credit in minor currency units
    fn cents_per_credit(&self) -> i64;

    /// ISO currency code for new orders
    fn currency(&self) -> &str;

    /// Create a checkout for an order. Returns the provider's session and
    /// the URL the buyer is redirected to.
    async fn create_checkout(
        &self,
        order: &OrderDBResponse,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession>;

    /// Settle an order with the provider (capture the payment) and report
    /// whether it has been paid.
    async fn get_payment_session(&self, order: &OrderDBResponse) -> Result<PaymentSession>;

    /// Validate and extract a webhook event from raw request data.
    ///
    /// Implementations must authenticate the delivery (signature or API
    /// verification) before trusting anything in the body; the webhook
    /// handler credits wallets on the result. Returns Err when the event is
    /// malformed or fails verification.
    async fn validate_webhook(&self, headers: &axum::http::HeaderMap, body: &str) -> Result<WebhookEvent>;
}

/// Credit the wallet for a paid order. Idempotent: the order status flip and
/// the ledger's unique `source_id` each stop a replay, and both run in one
/// transaction with the wallet credit.
pub async fn fulfill_order(db_pool: &sqlx::PgPool, order_id: OrderId) -> Result<OrderDBResponse> {
    let mut tx = db_pool.begin().await.map_err(DbError::from)?;

    let mut wallets = Wallets::new(&mut tx);
    let Some(order) = wallets.complete_order(order_id).await? else {
        // Either already completed/cancelled or never existed; the caller
        // decides how to report it
        tracing::trace!("Order {} not pending, skipping fulfilment", order_id);
        return Err(PaymentError::AlreadyProcessed);
    };

    let apply = wallets
        .apply(&TransactionCreateDBRequest {
            user_id: order.user_id,
            kind: TransactionKind::Purchase,
            amount: order.credits,
            source_id: Some(order.id.to_string()),
            description: Some(format!("Purchase of {} credits via {}", order.credits, order.provider)),
        })
        .await;

    match apply {
        Ok(_) => {}
        Err(DbError::UniqueViolation { constraint, .. })
            if constraint.as_deref() == Some("credit_transactions_source_id_unique") =>
        {
            tracing::trace!("Ledger entry for order {} already exists", order.id);
            return Err(PaymentError::AlreadyProcessed);
        }
        Err(e) => return Err(e.into()),
    }

    tx.commit().await.map_err(DbError::from)?;

    tracing::info!("Fulfilled order {} with {} credits for user {}", order.id, order.credits, order.user_id);
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::models::wallets::OrderCreateDBRequest;
    use crate::test_utils::create_test_user;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_fulfill_order_credits_wallet_once(pool: PgPool) {
        let user = create_test_user(&pool, Role::User).await;
        let mut conn = pool.acquire().await.unwrap();
        let order = Wallets::new(&mut conn)
            .create_order(&OrderCreateDBRequest {
                user_id: user.id,
                credits: 100,
                amount_cents: 1000,
                currency: "EUR".to_string(),
                provider: "dummy".to_string(),
                provider_order_id: None,
            })
            .await
            .unwrap();
        drop(conn);

        let fulfilled = fulfill_order(&pool, order.id).await.unwrap();
        assert_eq!(fulfilled.id, order.id);

        // Replay is rejected and the balance is unchanged
        assert!(matches!(fulfill_order(&pool, order.id).await, Err(PaymentError::AlreadyProcessed)));

        let mut conn = pool.acquire().await.unwrap();
        let wallet = Wallets::new(&mut conn).get_or_create(user.id).await.unwrap();
        assert_eq!(wallet.balance, 100);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_fulfill_unknown_order(pool: PgPool) {
        let result = fulfill_order(&pool, uuid::Uuid::new_v4()).await;
        assert!(matches!(result, Err(PaymentError::AlreadyProcessed)));
    }
}
