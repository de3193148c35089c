//! API request/response models for wallets, the credit ledger, and purchases.

use crate::db::models::wallets::{
    OrderDBResponse, OrderStatus, TransactionDBResponse, TransactionKind, WalletDBResponse,
};
use crate::types::{OrderId, TransactionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub balance: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<WalletDBResponse> for WalletResponse {
    fn from(db: WalletDBResponse) -> Self {
        Self {
            user_id: db.user_id,
            balance: db.balance,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub amount: i64,
    pub balance_after: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<TransactionDBResponse> for TransactionResponse {
    fn from(db: TransactionDBResponse) -> Self {
        Self {
            id: db.id,
            kind: db.kind,
            amount: db.amount,
            balance_after: db.balance_after,
            description: db.description,
            created_at: db.created_at,
        }
    }
}

/// Start a credit purchase.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseRequest {
    /// Number of credits to buy
    pub credits: i64,
}

/// A created purchase with the provider's checkout URL.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseResponse {
    pub order: OrderResponse,
    /// Where to send the buyer to complete payment
    pub checkout_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: OrderId,
    pub credits: i64,
    pub amount_cents: i64,
    pub currency: String,
    pub provider: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<OrderDBResponse> for OrderResponse {
    fn from(db: OrderDBResponse) -> Self {
        Self {
            id: db.id,
            credits: db.credits,
            amount_cents: db.amount_cents,
            currency: db.currency,
            provider: db.provider,
            status: db.status,
            created_at: db.created_at,
            completed_at: db.completed_at,
        }
    }
}
