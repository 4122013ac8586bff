/// Streak model: one row per learner
///
/// The row is only ever modified while locked (see [`Streak::lock`]), so
/// concurrent task completions by the same learner serialize on it. The
/// update rules themselves live in `crate::progress::streak`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Streak {
    pub user_id: Uuid,

    /// Consecutive calendar days (UTC) with at least one completion
    pub current_streak: i32,

    /// Highest `current_streak` ever reached
    pub longest_streak: i32,

    pub last_completed_date: Option<DateTime<Utc>>,

    /// Consecutive weeks completed on time
    pub weekly_streak: i32,

    /// Last week number that earned a weekly increment
    pub last_weekly_streak_awarded_week: Option<i32>,

    pub updated_at: DateTime<Utc>,
}

impl Streak {
    /// A zeroed streak for a learner without a row
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            current_streak: 0,
            longest_streak: 0,
            last_completed_date: None,
            weekly_streak: 0,
            last_weekly_streak_awarded_week: None,
            updated_at: Utc::now(),
        }
    }

    pub async fn find_by_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Streak>("SELECT * FROM streaks WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Streak rows of the given learners
    pub async fn list_by_users<'e, E: PgExecutor<'e>>(
        executor: E,
        user_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Streak>("SELECT * FROM streaks WHERE user_id = ANY($1)")
            .bind(user_ids)
            .fetch_all(executor)
            .await
    }

    /// Ensures the learner's row exists and locks it until the transaction ends
    ///
    /// Must be called inside a transaction.
    pub async fn lock(conn: &mut PgConnection, user_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query("INSERT INTO streaks (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query_as::<_, Streak>("SELECT * FROM streaks WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await
    }

    /// Writes back every counter of a locked row
    pub async fn save(conn: &mut PgConnection, streak: &Streak) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Streak>(
            r#"
            UPDATE streaks
            SET current_streak = $2,
                longest_streak = $3,
                last_completed_date = $4,
                weekly_streak = $5,
                last_weekly_streak_awarded_week = $6,
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(streak.user_id)
        .bind(streak.current_streak)
        .bind(streak.longest_streak)
        .bind(streak.last_completed_date)
        .bind(streak.weekly_streak)
        .bind(streak.last_weekly_streak_awarded_week)
        .fetch_one(conn)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_streak() {
        let user_id = Uuid::new_v4();
        let streak = Streak::empty(user_id);

        assert_eq!(streak.user_id, user_id);
        assert_eq!(streak.current_streak, 0);
        assert_eq!(streak.longest_streak, 0);
        assert_eq!(streak.weekly_streak, 0);
        assert!(streak.last_completed_date.is_none());
        assert!(streak.last_weekly_streak_awarded_week.is_none());
    }
}
