//! Database models for wallets, the credit ledger, and purchase orders.

use crate::types::{OrderId, TransactionId, UserId};
use chrono::{DateTime, Utc};

/// Why credits moved. Signs are enforced by the repository: purchases and
/// grants are positive, spends and removals negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type, utoipa::ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    Spend,
    AdminGrant,
    AdminRemoval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type, utoipa::ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WalletDBResponse {
    pub user_id: UserId,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ledger entry to append. `source_id` makes the apply idempotent: a
/// second apply with the same source hits the unique constraint instead of
/// double-crediting.
#[derive(Debug, Clone)]
pub struct TransactionCreateDBRequest {
    pub user_id: UserId,
    pub kind: TransactionKind,
    pub amount: i64,
    pub source_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionDBResponse {
    pub id: TransactionId,
    pub user_id: UserId,
    pub kind: TransactionKind,
    pub amount: i64,
    pub balance_after: i64,
    pub source_id: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OrderCreateDBRequest {
    pub user_id: UserId,
    pub credits: i64,
    pub amount_cents: i64,
    pub currency: String,
    pub provider: String,
    pub provider_order_id: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderDBResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub credits: i64,
    pub amount_cents: i64,
    pub currency: String,
    pub provider: String,
    pub provider_order_id: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
