/// Live session model
///
/// Creating a session also enqueues one reminder notification per learner of
/// the cohort, in the same transaction, so no learner is missed if the
/// request fails halfway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;
use validator::Validate;

use super::notification::Notification;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LiveSession {
    pub id: Uuid,
    pub cohort_id: Uuid,
    pub title: String,
    pub description: String,
    pub week_number: i32,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSession {
    pub cohort_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[validate(range(min = 1, message = "Week number must be positive"))]
    pub week_number: i32,

    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSession {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 1, message = "Week number must be positive"))]
    pub week_number: Option<i32>,

    pub scheduled_at: Option<DateTime<Utc>>,
}

impl LiveSession {
    /// Creates a session and enqueues its notifications
    ///
    /// Returns the session and the number of notifications enqueued. Call
    /// inside a transaction.
    pub async fn create_with_notifications(
        conn: &mut PgConnection,
        data: &NewSession,
    ) -> Result<(Self, u64), sqlx::Error> {
        let session = sqlx::query_as::<_, LiveSession>(
            r#"
            INSERT INTO live_sessions (cohort_id, title, description, week_number, scheduled_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.cohort_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.week_number)
        .bind(data.scheduled_at)
        .fetch_one(&mut *conn)
        .await?;

        let enqueued = Notification::enqueue_for_cohort(&mut *conn, session.id, session.cohort_id).await?;

        Ok((session, enqueued))
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, LiveSession>("SELECT * FROM live_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_by_cohort<'e, E: PgExecutor<'e>>(
        executor: E,
        cohort_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, LiveSession>(
            r#"
            SELECT * FROM live_sessions
            WHERE cohort_id = $1
            ORDER BY week_number, scheduled_at NULLS LAST, created_at
            "#,
        )
        .bind(cohort_id)
        .fetch_all(executor)
        .await
    }

    /// Applies the provided fields; None leaves a field unchanged
    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        data: &UpdateSession,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, LiveSession>(
            r#"
            UPDATE live_sessions
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                week_number = COALESCE($4, week_number),
                scheduled_at = COALESCE($5, scheduled_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.week_number)
        .bind(data.scheduled_at)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a session together with its notifications
    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM live_sessions WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_validation() {
        let session = NewSession {
            cohort_id: Uuid::new_v4(),
            title: String::new(),
            description: String::new(),
            week_number: 0,
            scheduled_at: None,
        };

        let errors = session.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
        assert!(errors.field_errors().contains_key("week_number"));
    }

    #[test]
    fn test_update_session_partial() {
        let update: UpdateSession = serde_json::from_str(r#"{"title":"Office hours"}"#).unwrap();
        assert_eq!(update.title.as_deref(), Some("Office hours"));
        assert!(update.week_number.is_none());
        assert!(update.validate().is_ok());
    }
}
