//! Payment provider webhook.
//!
//! Providers notify us about settled payments out-of-band. The configured
//! provider authenticates the delivery (PayPal verifies the transmission
//! signature against our registered webhook id) before the handler maps the
//! event back to our order via the provider's order id and runs the same
//! idempotent fulfilment as the capture endpoint. Events we cannot act on
//! are acknowledged anyway so the provider stops retrying.

use axum::{extract::State, http::HeaderMap, http::StatusCode};

use crate::{AppState, db::handlers::Wallets, errors::Error, payment_providers::PaymentError};

/// Payment provider webhook receiver
#[utoipa::path(
    post,
    path = "/webhooks/payments",
    tag = "webhooks",
    responses(
        (status = 200, description = "Event processed or ignored"),
        (status = 400, description = "Event failed validation"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn payment_webhook(State(state): State<AppState>, headers: HeaderMap, body: String) -> Result<StatusCode, Error> {
    let Some(provider) = state.payment_provider.clone() else {
        tracing::warn!("Payment webhook received but no provider is configured");
        return Ok(StatusCode::OK);
    };

    // Unverifiable deliveries are rejected here, before any order lookup
    let event = provider.validate_webhook(&headers, &body).await.map_err(Error::from)?;

    tracing::debug!("Payment webhook event: {}", event.event_type);

    let completed = event.event_type.ends_with("CAPTURE.COMPLETED");
    let denied = event.event_type.ends_with("CAPTURE.DENIED");
    if !completed && !denied {
        return Ok(StatusCode::OK);
    }

    let Some(provider_order_id) = event.provider_order_id.as_deref() else {
        tracing::warn!("Capture event without a provider order id");
        return Ok(StatusCode::OK);
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let Some(order) = Wallets::new(&mut conn).get_order_by_provider_id(provider_order_id).await? else {
        tracing::warn!("Capture event for unknown provider order {}", provider_order_id);
        return Ok(StatusCode::OK);
    };

    if denied {
        // Only pending orders cancel; a settled order stays completed
        Wallets::new(&mut conn).cancel_order(order.id).await?;
        return Ok(StatusCode::OK);
    }
    drop(conn);

    match crate::payment_providers::fulfill_order(&state.db, order.id).await {
        Ok(_) => Ok(StatusCode::OK),
        // The capture endpoint may have settled it first
        Err(PaymentError::AlreadyProcessed) => Ok(StatusCode::OK),
        Err(e) => Err(e.into()),
    }
}
