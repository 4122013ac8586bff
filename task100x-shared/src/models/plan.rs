/// Plan model: a learner's personalized set of tasks within a cohort
///
/// A learner may have several plans in a cohort, typically one per week the
/// plan was generated for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::task::TaskDetail;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cohort_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A plan with its tasks, as returned to the learner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanWithTasks {
    #[serde(flatten)]
    pub plan: Plan,
    pub tasks: Vec<TaskDetail>,
}

impl Plan {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
        cohort_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Plan>(
            "INSERT INTO plans (user_id, cohort_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(cohort_id)
        .fetch_one(executor)
        .await
    }

    /// Most recent plan of a learner holding tasks for `week_number`
    pub async fn find_for_week<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
        cohort_id: Uuid,
        week_number: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Plan>(
            r#"
            SELECT p.* FROM plans p
            WHERE p.user_id = $1 AND p.cohort_id = $2
              AND EXISTS (
                  SELECT 1 FROM tasks t
                  JOIN resources r ON r.id = t.resource_id
                  WHERE t.plan_id = p.id AND r.week_number = $3
              )
            ORDER BY p.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(cohort_id)
        .bind(week_number)
        .fetch_optional(executor)
        .await
    }

    /// Distinct learners holding a plan in the cohort
    pub async fn learner_ids<'e, E: PgExecutor<'e>>(
        executor: E,
        cohort_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT DISTINCT user_id FROM plans WHERE cohort_id = $1")
            .bind(cohort_id)
            .fetch_all(executor)
            .await
    }
}
