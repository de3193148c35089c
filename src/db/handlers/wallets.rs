//! Wallet balances, the append-only credit ledger, and purchase orders.
//!
//! Every balance change goes through [`Wallets::apply`], which runs a single
//! database transaction: lock the wallet row, check the resulting balance,
//! append the ledger entry with `balance_after`, update the cached balance.
//! The ledger is never updated or deleted; the wallet balance is derivable
//! from it at any time.

use crate::types::{OrderId, UserId, abbrev_uuid};
use crate::db::{
    errors::{DbError, Result},
    models::wallets::{
        OrderCreateDBRequest, OrderDBResponse, TransactionCreateDBRequest, TransactionDBResponse,
        WalletDBResponse,
    },
};
use sqlx::{Connection, PgConnection};
use tracing::instrument;

/// Default page sizes for the read-only listings.
pub const TRANSACTIONS_LIMIT: i64 = 100;
pub const ORDERS_LIMIT: i64 = 50;

pub struct Wallets<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Wallets<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Fetch the wallet, creating it with a zero balance when missing.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_or_create(&mut self, user_id: UserId) -> Result<WalletDBResponse> {
        sqlx::query("INSERT INTO wallets (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        let wallet = sqlx::query_as::<_, WalletDBResponse>("SELECT * FROM wallets WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(wallet)
    }

    /// Apply one signed ledger entry atomically.
    ///
    /// The wallet row is locked for the duration of the transaction, so two
    /// concurrent applies serialize and each `balance_after` is exact. A
    /// negative resulting balance is rejected before touching the ledger; a
    /// replayed `source_id` surfaces as a unique violation.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), amount = request.amount), err)]
    pub async fn apply(&mut self, request: &TransactionCreateDBRequest) -> Result<TransactionDBResponse> {
        let mut tx = self.db.begin().await?;

        sqlx::query("INSERT INTO wallets (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(request.user_id)
            .execute(&mut *tx)
            .await?;

        let (balance,): (i64,) = sqlx::query_as("SELECT balance FROM wallets WHERE user_id = $1 FOR UPDATE")
            .bind(request.user_id)
            .fetch_one(&mut *tx)
            .await?;

        let balance_after = balance + request.amount;
        if balance_after < 0 {
            // Same shape the CHECK constraint would produce, caught early to
            // keep the error message useful
            return Err(DbError::CheckViolation {
                constraint: Some("wallets_balance_check".to_string()),
                table: Some("wallets".to_string()),
                message: format!("Insufficient balance: {} available, {} requested", balance, -request.amount),
            });
        }

        let entry = sqlx::query_as::<_, TransactionDBResponse>(
            r#"
            INSERT INTO credit_transactions (user_id, kind, amount, balance_after, source_id, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.kind)
        .bind(request.amount)
        .bind(balance_after)
        .bind(&request.source_id)
        .bind(&request.description)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE wallets SET balance = $2, updated_at = NOW() WHERE user_id = $1")
            .bind(request.user_id)
            .bind(balance_after)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(entry)
    }

    /// Ledger history, newest first.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_transactions(&mut self, user_id: UserId, limit: i64) -> Result<Vec<TransactionDBResponse>> {
        let entries = sqlx::query_as::<_, TransactionDBResponse>(
            r#"
            SELECT * FROM credit_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(entries)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), credits = request.credits), err)]
    pub async fn create_order(&mut self, request: &OrderCreateDBRequest) -> Result<OrderDBResponse> {
        let order = sqlx::query_as::<_, OrderDBResponse>(
            r#"
            INSERT INTO credit_orders (user_id, credits, amount_cents, currency, provider, provider_order_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.credits)
        .bind(request.amount_cents)
        .bind(&request.currency)
        .bind(&request.provider)
        .bind(&request.provider_order_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    pub async fn get_order(&mut self, id: OrderId) -> Result<Option<OrderDBResponse>> {
        let order = sqlx::query_as::<_, OrderDBResponse>("SELECT * FROM credit_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(order)
    }

    #[instrument(skip(self), err)]
    pub async fn get_order_by_provider_id(&mut self, provider_order_id: &str) -> Result<Option<OrderDBResponse>> {
        let order = sqlx::query_as::<_, OrderDBResponse>("SELECT * FROM credit_orders WHERE provider_order_id = $1")
            .bind(provider_order_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(order)
    }

    /// Attach the provider's order id once the checkout session exists.
    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    pub async fn set_provider_order_id(&mut self, id: OrderId, provider_order_id: &str) -> Result<Option<OrderDBResponse>> {
        let order = sqlx::query_as::<_, OrderDBResponse>(
            "UPDATE credit_orders SET provider_order_id = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(provider_order_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(order)
    }

    /// Flip a pending order to completed. Exactly one caller wins; everyone
    /// else sees `None` and treats the order as already processed.
    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    pub async fn complete_order(&mut self, id: OrderId) -> Result<Option<OrderDBResponse>> {
        let order = sqlx::query_as::<_, OrderDBResponse>(
            r#"
            UPDATE credit_orders
            SET status = 'completed', completed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    pub async fn cancel_order(&mut self, id: OrderId) -> Result<Option<OrderDBResponse>> {
        let order = sqlx::query_as::<_, OrderDBResponse>(
            r#"
            UPDATE credit_orders
            SET status = 'cancelled'
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(order)
    }

    /// Order history, newest first.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_orders(&mut self, user_id: UserId, limit: i64) -> Result<Vec<OrderDBResponse>> {
        let orders = sqlx::query_as::<_, OrderDBResponse>(
            r#"
            SELECT * FROM credit_orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(orders)
    }
}
