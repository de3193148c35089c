//! Admin moderation queues and status decisions.
//!
//! All five moderated tables share the same `(id, owner, status)` columns, so
//! the queue and decision queries are built per [`ContentKind`] from static
//! table/column names. No user input ever reaches the SQL text.

use crate::moderation::{ContentKind, ModerationStatus};
use crate::types::abbrev_uuid;
use crate::db::errors::Result;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// One pending item in a moderation queue.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ModerationQueueItem {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
}

pub struct Moderation<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Moderation<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Items awaiting review for one kind, oldest first.
    #[instrument(skip(self), fields(kind = ?kind), err)]
    pub async fn queue(&mut self, kind: ContentKind, skip: i64, limit: i64) -> Result<Vec<ModerationQueueItem>> {
        let sql = format!(
            "SELECT id, {owner} AS owner_id, status, created_at FROM {table} \
             WHERE status = 'in_review' ORDER BY created_at ASC LIMIT $1 OFFSET $2",
            owner = kind.owner_column(),
            table = kind.table(),
        );

        let items = sqlx::query_as::<_, ModerationQueueItem>(&sql)
            .bind(limit)
            .bind(skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(items)
    }

    /// Admin decision: set any status from any status, including resetting
    /// terminal ones. Returns false when the item does not exist.
    #[instrument(skip(self), fields(kind = ?kind, id = %abbrev_uuid(&id), status = %status), err)]
    pub async fn decide(&mut self, kind: ContentKind, id: Uuid, status: ModerationStatus) -> Result<bool> {
        let sql = format!(
            "UPDATE {table} SET status = $2, updated_at = NOW() WHERE id = $1",
            table = kind.table(),
        );

        let result = sqlx::query(&sql).bind(id).bind(status).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }
}
