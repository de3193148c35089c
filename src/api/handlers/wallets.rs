//! Wallet, ledger, and credit purchase endpoints.
//!
//! Purchases flow order → provider checkout → capture. The capture endpoint
//! re-verifies payment with the provider before crediting, and fulfilment is
//! idempotent, so a buyer refreshing the success page cannot double-credit.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::wallets::{OrderResponse, PurchaseRequest, PurchaseResponse, TransactionResponse, WalletResponse},
    auth::{permissions, session::AuthUser},
    db::handlers::Wallets,
    db::handlers::wallets::{ORDERS_LIMIT, TRANSACTIONS_LIMIT},
    db::models::wallets::OrderCreateDBRequest,
    errors::Error,
    payment_providers::{PaymentError, fulfill_order},
    types::OrderId,
};

const MAX_PURCHASE_CREDITS: i64 = 100_000;

/// Get the caller's wallet, creating it when missing
#[utoipa::path(
    get,
    path = "/api/v1/wallet",
    tag = "wallet",
    responses(
        (status = 200, description = "Wallet", body = WalletResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_wallet(State(state): State<AppState>, auth: AuthUser) -> Result<Json<WalletResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    let wallet = Wallets::new(&mut conn).get_or_create(actor.id).await?;

    Ok(Json(WalletResponse::from(wallet)))
}

/// List the caller's ledger entries, newest first
#[utoipa::path(
    get,
    path = "/api/v1/wallet/transactions",
    tag = "wallet",
    responses(
        (status = 200, description = "Ledger entries, newest first", body = Vec<TransactionResponse>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<TransactionResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    let entries = Wallets::new(&mut conn)
        .list_transactions(actor.id, TRANSACTIONS_LIMIT)
        .await?;

    Ok(Json(entries.into_iter().map(TransactionResponse::from).collect()))
}

/// List the caller's purchase orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/wallet/orders",
    tag = "wallet",
    responses(
        (status = 200, description = "Orders, newest first", body = Vec<OrderResponse>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_orders(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<OrderResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    let orders = Wallets::new(&mut conn).list_orders(actor.id, ORDERS_LIMIT).await?;

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// Start a credit purchase and get the provider's checkout URL
#[utoipa::path(
    post,
    path = "/api/v1/wallet/purchases",
    request_body = PurchaseRequest,
    tag = "wallet",
    responses(
        (status = 201, description = "Created order with checkout URL", body = PurchaseResponse),
        (status = 400, description = "Invalid credit amount or no payment provider configured"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(credits = request.credits))]
pub async fn create_purchase(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), Error> {
    if request.credits < 1 || request.credits > MAX_PURCHASE_CREDITS {
        return Err(Error::BadRequest {
            message: format!("Credits must be between 1 and {MAX_PURCHASE_CREDITS}"),
        });
    }

    let Some(provider) = state.payment_provider.clone() else {
        return Err(Error::BadRequest {
            message: "No payment provider is configured".to_string(),
        });
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    let mut wallets = Wallets::new(&mut conn);
    let order = wallets
        .create_order(&OrderCreateDBRequest {
            user_id: actor.id,
            credits: request.credits,
            amount_cents: request.credits * provider.cents_per_credit(),
            currency: provider.currency().to_string(),
            provider: provider.name().to_string(),
            provider_order_id: None,
        })
        .await?;

    let success_url = format!("{}/wallet/purchases/{{ORDER_ID}}/success", state.config.site_url);
    let cancel_url = format!("{}/wallet", state.config.site_url);

    let session = provider
        .create_checkout(&order, &success_url, &cancel_url)
        .await
        .map_err(Error::from)?;

    let order = match &session.provider_order_id {
        Some(provider_order_id) => wallets
            .set_provider_order_id(order.id, provider_order_id)
            .await?
            .unwrap_or(order),
        None => order,
    };

    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            order: OrderResponse::from(order),
            checkout_url: session.checkout_url,
        }),
    ))
}

/// Capture a purchase after the buyer returns from checkout.
///
/// Verifies payment with the provider, then credits the wallet. Safe to call
/// repeatedly: a settled order reports its current state instead of paying
/// out twice.
#[utoipa::path(
    post,
    path = "/api/v1/wallet/purchases/{order_id}/capture",
    params(("order_id" = uuid::Uuid, Path, description = "Order id")),
    tag = "wallet",
    responses(
        (status = 200, description = "Order state after capture", body = OrderResponse),
        (status = 400, description = "Payment not completed"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such order"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(order_id = %order_id))]
pub async fn capture_purchase(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>, Error> {
    let Some(provider) = state.payment_provider.clone() else {
        return Err(Error::BadRequest {
            message: "No payment provider is configured".to_string(),
        });
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = permissions::load_actor(&mut conn, &auth).await?;

    let order = Wallets::new(&mut conn)
        .get_order(order_id)
        .await?
        // Someone else's order looks absent
        .filter(|order| order.user_id == actor.id)
        .ok_or_else(|| Error::NotFound {
            resource: "Order".to_string(),
            id: order_id.to_string(),
        })?;
    drop(conn);

    let session = provider.get_payment_session(&order).await.map_err(Error::from)?;
    if !session.is_paid {
        return Err(PaymentError::PaymentNotCompleted.into());
    }

    match fulfill_order(&state.db, order.id).await {
        Ok(fulfilled) => Ok(Json(OrderResponse::from(fulfilled))),
        Err(PaymentError::AlreadyProcessed) => {
            // Idempotent success: report the order as it stands
            let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
            let order = Wallets::new(&mut conn)
                .get_order(order_id)
                .await?
                .ok_or_else(|| Error::NotFound {
                    resource: "Order".to_string(),
                    id: order_id.to_string(),
                })?;
            Ok(Json(OrderResponse::from(order)))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::models::wallets::OrderStatus;
    use crate::test_utils::{create_test_app_with_user, create_test_user};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_wallet_starts_empty(pool: PgPool) {
        let user = create_test_user(&pool, Role::User).await;
        let server = create_test_app_with_user(pool, &user).await;

        let response = server.get("/api/v1/wallet").await;
        response.assert_status_ok();

        let wallet: WalletResponse = response.json();
        assert_eq!(wallet.user_id, user.id);
        assert_eq!(wallet.balance, 0);
    }

    #[sqlx::test]
    async fn test_purchase_and_capture(pool: PgPool) {
        let user = create_test_user(&pool, Role::User).await;
        let server = create_test_app_with_user(pool, &user).await;

        let response = server
            .post("/api/v1/wallet/purchases")
            .json(&PurchaseRequest { credits: 100 })
            .await;
        response.assert_status(StatusCode::CREATED);

        let purchase: PurchaseResponse = response.json();
        assert_eq!(purchase.order.credits, 100);
        assert_eq!(purchase.order.status, OrderStatus::Pending);
        // The dummy provider substitutes the order id into the success URL
        assert!(purchase.checkout_url.contains(&purchase.order.id.to_string()));

        let response = server
            .post(&format!("/api/v1/wallet/purchases/{}/capture", purchase.order.id))
            .await;
        response.assert_status_ok();

        let captured: OrderResponse = response.json();
        assert_eq!(captured.status, OrderStatus::Completed);

        let wallet: WalletResponse = server.get("/api/v1/wallet").await.json();
        assert_eq!(wallet.balance, 100);
    }

    #[sqlx::test]
    async fn test_capture_is_idempotent(pool: PgPool) {
        let user = create_test_user(&pool, Role::User).await;
        let server = create_test_app_with_user(pool, &user).await;

        let purchase: PurchaseResponse = server
            .post("/api/v1/wallet/purchases")
            .json(&PurchaseRequest { credits: 50 })
            .await
            .json();

        let capture_url = format!("/api/v1/wallet/purchases/{}/capture", purchase.order.id);
        server.post(&capture_url).await.assert_status_ok();

        // Refreshing the success page reports the same completed order
        let response = server.post(&capture_url).await;
        response.assert_status_ok();
        let order: OrderResponse = response.json();
        assert_eq!(order.status, OrderStatus::Completed);

        let wallet: WalletResponse = server.get("/api/v1/wallet").await.json();
        assert_eq!(wallet.balance, 50);

        let entries: Vec<TransactionResponse> = server.get("/api/v1/wallet/transactions").await.json();
        assert_eq!(entries.len(), 1);
    }

    #[sqlx::test]
    async fn test_capture_foreign_order_reports_not_found(pool: PgPool) {
        let buyer = create_test_user(&pool, Role::User).await;
        let other = create_test_user(&pool, Role::User).await;

        let server = create_test_app_with_user(pool.clone(), &buyer).await;
        let purchase: PurchaseResponse = server
            .post("/api/v1/wallet/purchases")
            .json(&PurchaseRequest { credits: 10 })
            .await
            .json();

        let server = create_test_app_with_user(pool, &other).await;
        let response = server
            .post(&format!("/api/v1/wallet/purchases/{}/capture", purchase.order.id))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_purchase_rejects_bad_amounts(pool: PgPool) {
        let user = create_test_user(&pool, Role::User).await;
        let server = create_test_app_with_user(pool, &user).await;

        for credits in [0, -5, MAX_PURCHASE_CREDITS + 1] {
            let response = server
                .post("/api/v1/wallet/purchases")
                .json(&json!({"credits": credits}))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[sqlx::test]
    async fn test_order_listing(pool: PgPool) {
        let user = create_test_user(&pool, Role::User).await;
        let server = create_test_app_with_user(pool, &user).await;

        for credits in [10, 20] {
            server
                .post("/api/v1/wallet/purchases")
                .json(&PurchaseRequest { credits })
                .await
                .assert_status(StatusCode::CREATED);
        }

        let orders: Vec<OrderResponse> = server.get("/api/v1/wallet/orders").await.json();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].credits, 20); // newest first
    }
}
