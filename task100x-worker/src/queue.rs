/// Notification queue
///
/// The `notifications` table is the queue. A row is due when its status is
/// PENDING (needs a draft) or QUEUED (needs delivery) and `next_attempt_at`
/// has passed.
///
/// # Claiming
///
/// Claiming locks due rows with `FOR UPDATE SKIP LOCKED` and pushes their
/// `next_attempt_at` forward by a lease, so several workers can poll the same
/// table without picking up the same notification. A worker that dies
/// mid-job simply lets the lease expire and the row becomes due again.
///
/// Every state change below is conditional on the status the worker claimed,
/// so an instructor edit that lands in between is never overwritten.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use task100x_worker::queue::NotificationQueue;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let queue = NotificationQueue::new(pool, Duration::from_secs(300));
/// let due = queue.claim_due(10, true).await?;
/// println!("Claimed {} notifications", due.len());
/// # Ok(())
/// # }
/// ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use task100x_shared::models::notification::{Notification, NotificationContext};
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationQueue {
    db: PgPool,
    lease: Duration,
}

impl NotificationQueue {
    pub fn new(db: PgPool, lease: Duration) -> Self {
        Self { db, lease }
    }

    /// Claims up to `limit` due notifications
    ///
    /// QUEUED rows are only claimed when `include_queued` is set, which the
    /// worker turns off when it has no delivery channel.
    pub async fn claim_due(
        &self,
        limit: i64,
        include_queued: bool,
    ) -> Result<Vec<NotificationContext>, sqlx::Error> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            WITH due AS (
                SELECT id
                FROM notifications
                WHERE (status = 'PENDING' OR ($2 AND status = 'QUEUED'))
                  AND next_attempt_at <= NOW()
                ORDER BY next_attempt_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE notifications n
            SET next_attempt_at = NOW() + make_interval(secs => $3),
                updated_at = NOW()
            FROM due
            WHERE n.id = due.id
            RETURNING n.id
            "#,
        )
        .bind(limit)
        .bind(include_queued)
        .bind(self.lease.as_secs_f64())
        .fetch_all(&self.db)
        .await?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(count = ids.len(), "Claimed notifications");
        Notification::contexts_by_ids(&self.db, &ids).await
    }

    /// PENDING → DRAFT with the generated message
    pub async fn mark_drafted(&self, id: Uuid, message: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'DRAFT',
                message = $2,
                attempts = 0,
                last_error = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(id)
        .bind(message)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// QUEUED → SENT
    pub async fn mark_sent(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'SENT',
                sent_at = NOW(),
                last_error = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'QUEUED'
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Records a failed attempt and schedules the next one
    pub async fn schedule_retry(
        &self,
        id: Uuid,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET attempts = attempts + 1,
                last_error = $2,
                next_attempt_at = $3,
                updated_at = NOW()
            WHERE id = $1 AND status IN ('PENDING', 'QUEUED')
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(next_attempt_at)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Records a failed attempt and gives up on the notification
    pub async fn mark_failed(&self, id: Uuid, error: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'FAILED',
                attempts = attempts + 1,
                last_error = $2,
                updated_at = NOW()
            WHERE id = $1 AND status IN ('PENDING', 'QUEUED')
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
