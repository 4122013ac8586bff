/// Resource model: a piece of weekly learning content
///
/// Resources belong to a cohort and a curriculum week. A learner's tasks are
/// created from the resources of a week; optional resources never count
/// toward progress or streaks.
///
/// # Example
///
/// ```no_run
/// use task100x_shared::models::resource::{group_by_week, Resource};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, cohort_id: Uuid) -> Result<(), sqlx::Error> {
/// let resources = Resource::list_by_cohort(&pool, cohort_id).await?;
/// for week in group_by_week(resources) {
///     println!("week {}: {} resources", week.week_number, week.resources.len());
/// }
/// # Ok(())
/// # }
/// ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;
use validator::Validate;

/// Kind of learning content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "resource_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Video,
    Article,
    Document,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Resource {
    pub id: Uuid,
    pub cohort_id: Uuid,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Expected time to complete, in minutes
    pub duration: i32,
    pub tags: Vec<String>,
    pub week_number: i32,
    pub is_optional: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for a single resource within a week
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewResource {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(url(message = "Invalid URL"))]
    pub url: String,

    #[serde(rename = "type")]
    pub resource_type: ResourceType,

    #[validate(range(min = 0, message = "Duration cannot be negative"))]
    #[serde(default)]
    pub duration: i32,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub is_optional: bool,
}

/// Resources of one week, as returned by the grouped listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekResources {
    pub week_number: i32,
    pub resources: Vec<Resource>,
}

/// Groups resources by week, weeks ascending, preserving order within a week
pub fn group_by_week(resources: Vec<Resource>) -> Vec<WeekResources> {
    let mut weeks: BTreeMap<i32, Vec<Resource>> = BTreeMap::new();

    for resource in resources {
        weeks.entry(resource.week_number).or_default().push(resource);
    }

    weeks
        .into_iter()
        .map(|(week_number, resources)| WeekResources {
            week_number,
            resources,
        })
        .collect()
}

impl Resource {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        cohort_id: Uuid,
        week_number: i32,
        data: &NewResource,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Resource>(
            r#"
            INSERT INTO resources (cohort_id, title, url, resource_type, duration, tags,
                                   week_number, is_optional)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(cohort_id)
        .bind(&data.title)
        .bind(&data.url)
        .bind(data.resource_type)
        .bind(data.duration)
        .bind(&data.tags)
        .bind(week_number)
        .bind(data.is_optional)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// All resources of a cohort ordered by week, then creation
    pub async fn list_by_cohort<'e, E: PgExecutor<'e>>(
        executor: E,
        cohort_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Resource>(
            "SELECT * FROM resources WHERE cohort_id = $1 ORDER BY week_number, created_at, id",
        )
        .bind(cohort_id)
        .fetch_all(executor)
        .await
    }

    pub async fn list_by_week<'e, E: PgExecutor<'e>>(
        executor: E,
        cohort_id: Uuid,
        week_number: i32,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Resource>(
            r#"
            SELECT * FROM resources
            WHERE cohort_id = $1 AND week_number = $2
            ORDER BY created_at, id
            "#,
        )
        .bind(cohort_id)
        .bind(week_number)
        .fetch_all(executor)
        .await
    }

    /// Replaces every resource of a week with `resources`
    ///
    /// Runs on a single connection so the caller can wrap it in a transaction.
    pub async fn replace_week(
        conn: &mut PgConnection,
        cohort_id: Uuid,
        week_number: i32,
        resources: &[NewResource],
    ) -> Result<Vec<Self>, sqlx::Error> {
        Self::delete_week(&mut *conn, cohort_id, week_number).await?;

        let mut created = Vec::with_capacity(resources.len());
        for resource in resources {
            created.push(Self::create(&mut *conn, cohort_id, week_number, resource).await?);
        }

        Ok(created)
    }

    /// Deletes a resource, returning whether it existed
    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes all resources of a week, returning how many were removed
    pub async fn delete_week<'e, E: PgExecutor<'e>>(
        executor: E,
        cohort_id: Uuid,
        week_number: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resources WHERE cohort_id = $1 AND week_number = $2")
            .bind(cohort_id)
            .bind(week_number)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Completed learner tasks that point at a resource
    ///
    /// Deleting a resource cascades to its tasks, so this is the history a
    /// delete would erase.
    pub async fn completed_task_count<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE resource_id = $1 AND status = 'COMPLETED'",
        )
        .bind(id)
        .fetch_one(executor)
        .await
    }

    /// Completed learner tasks that point at any resource of a week
    pub async fn completed_task_count_for_week<'e, E: PgExecutor<'e>>(
        executor: E,
        cohort_id: Uuid,
        week_number: i32,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM tasks t
            JOIN resources r ON r.id = t.resource_id
            WHERE r.cohort_id = $1 AND r.week_number = $2 AND t.status = 'COMPLETED'
            "#,
        )
        .bind(cohort_id)
        .bind(week_number)
        .fetch_one(executor)
        .await
    }

    pub async fn count_by_cohort<'e, E: PgExecutor<'e>>(
        executor: E,
        cohort_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM resources WHERE cohort_id = $1")
            .bind(cohort_id)
            .fetch_one(executor)
            .await
    }
}
