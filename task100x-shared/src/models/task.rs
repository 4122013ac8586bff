/// Task model: one resource assigned to a learner through a plan
///
/// # State Machine
///
/// ```text
/// PENDING → COMPLETED
/// ```
///
/// Completion is one-way. Completing an already completed task changes
/// nothing, which keeps streak updates idempotent.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('PENDING', 'COMPLETED');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     plan_id UUID NOT NULL REFERENCES plans(id) ON DELETE CASCADE,
///     resource_id UUID NOT NULL REFERENCES resources(id) ON DELETE CASCADE,
///     status task_status NOT NULL DEFAULT 'PENDING',
///     assigned_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     completed_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::resource::ResourceType;

/// Task completion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        matches!((self, target), (TaskStatus::Pending, TaskStatus::Completed))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub resource_id: Uuid,
    pub status: TaskStatus,
    pub assigned_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Task joined with its resource, as shown in a learner's plan
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskDetail {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub resource_id: Uuid,
    pub status: TaskStatus,
    pub assigned_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub duration: i32,
    pub week_number: i32,
    pub is_optional: bool,
}

/// A task with its owner and curriculum position, locked for completion
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OwnedTask {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cohort_id: Uuid,
    pub status: TaskStatus,
    pub assigned_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub week_number: i32,
    pub is_optional: bool,
}

/// Flattened task row used by progress, streak and leaderboard computations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskProgressRow {
    pub user_id: Uuid,
    pub week_number: i32,
    pub is_optional: bool,
    pub status: TaskStatus,
    pub assigned_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskProgressRow {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

const DETAIL_SELECT: &str = r#"
    SELECT t.id, t.plan_id, t.resource_id, t.status, t.assigned_date, t.completed_at,
           r.title, r.url, r.resource_type, r.duration, r.week_number, r.is_optional
    FROM tasks t
    JOIN resources r ON r.id = t.resource_id
"#;

const PROGRESS_SELECT: &str = r#"
    SELECT p.user_id, r.week_number, r.is_optional, t.status, t.assigned_date, t.completed_at
    FROM tasks t
    JOIN plans p ON p.id = t.plan_id
    JOIN resources r ON r.id = t.resource_id
"#;

impl Task {
    /// Creates one PENDING task per resource
    pub async fn create_for_plan(
        conn: &mut PgConnection,
        plan_id: Uuid,
        resource_ids: &[Uuid],
        assigned_date: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut tasks = Vec::with_capacity(resource_ids.len());

        for resource_id in resource_ids {
            let task = sqlx::query_as::<_, Task>(
                r#"
                INSERT INTO tasks (plan_id, resource_id, status, assigned_date)
                VALUES ($1, $2, 'PENDING', $3)
                RETURNING *
                "#,
            )
            .bind(plan_id)
            .bind(resource_id)
            .bind(assigned_date)
            .fetch_one(&mut *conn)
            .await?;
            tasks.push(task);
        }

        Ok(tasks)
    }

    /// Finds a task owned by `user_id` and locks it for update
    ///
    /// Returns None both when the task doesn't exist and when it belongs to
    /// someone else.
    pub async fn find_owned_for_update(
        conn: &mut PgConnection,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OwnedTask>, sqlx::Error> {
        sqlx::query_as::<_, OwnedTask>(
            r#"
            SELECT t.id, p.user_id, p.cohort_id, t.status, t.assigned_date, t.completed_at,
                   r.week_number, r.is_optional
            FROM tasks t
            JOIN plans p ON p.id = t.plan_id
            JOIN resources r ON r.id = t.resource_id
            WHERE t.id = $1 AND p.user_id = $2
            FOR UPDATE OF t
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
    }

    /// Marks a pending task as completed
    ///
    /// Returns None when the task was already completed.
    pub async fn mark_completed<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = 'COMPLETED', completed_at = $2
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(completed_at)
        .fetch_optional(executor)
        .await
    }

    /// Tasks of a plan for one week, in resource order
    pub async fn list_details_for_week<'e, E: PgExecutor<'e>>(
        executor: E,
        plan_id: Uuid,
        week_number: i32,
    ) -> Result<Vec<TaskDetail>, sqlx::Error> {
        let query = format!(
            "{} WHERE t.plan_id = $1 AND r.week_number = $2 ORDER BY r.created_at, r.id",
            DETAIL_SELECT
        );

        sqlx::query_as::<_, TaskDetail>(&query)
            .bind(plan_id)
            .bind(week_number)
            .fetch_all(executor)
            .await
    }

    pub async fn list_details_for_plan<'e, E: PgExecutor<'e>>(
        executor: E,
        plan_id: Uuid,
    ) -> Result<Vec<TaskDetail>, sqlx::Error> {
        let query = format!(
            "{} WHERE t.plan_id = $1 ORDER BY r.week_number, r.created_at, r.id",
            DETAIL_SELECT
        );

        sqlx::query_as::<_, TaskDetail>(&query)
            .bind(plan_id)
            .fetch_all(executor)
            .await
    }

    /// Every task of a learner, optionally restricted to one cohort
    pub async fn progress_rows_for_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
        cohort_id: Option<Uuid>,
    ) -> Result<Vec<TaskProgressRow>, sqlx::Error> {
        let query = format!(
            "{} WHERE p.user_id = $1 AND ($2::uuid IS NULL OR p.cohort_id = $2) ORDER BY r.week_number, t.assigned_date",
            PROGRESS_SELECT
        );

        sqlx::query_as::<_, TaskProgressRow>(&query)
            .bind(user_id)
            .bind(cohort_id)
            .fetch_all(executor)
            .await
    }

    /// Every task of every learner, optionally restricted to one cohort
    pub async fn progress_rows<'e, E: PgExecutor<'e>>(
        executor: E,
        cohort_id: Option<Uuid>,
    ) -> Result<Vec<TaskProgressRow>, sqlx::Error> {
        let query = format!(
            "{} WHERE ($1::uuid IS NULL OR p.cohort_id = $1) ORDER BY p.user_id, r.week_number",
            PROGRESS_SELECT
        );

        sqlx::query_as::<_, TaskProgressRow>(&query)
            .bind(cohort_id)
            .fetch_all(executor)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_transitions() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Pending));
    }

    #[test]
    fn test_task_status_wire_format() {
        assert_eq!(TaskStatus::Completed.as_str(), "COMPLETED");
        assert_eq!(
            serde_json::to_string(&TaskStatus::Pending).unwrap(),
            "\"PENDING\""
        );
    }
}
