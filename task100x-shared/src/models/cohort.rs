/// Cohort model and database operations
///
/// A cohort is a batch of learners following the same multi-week curriculum.
/// Its end date is always derived from the start date and the week count.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Longest curriculum a cohort may run
pub const MAX_TOTAL_WEEKS: i32 = 52;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cohort {
    pub id: Uuid,
    pub name: String,
    pub total_weeks: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCohort {
    pub name: String,
    pub total_weeks: i32,
    pub start_date: DateTime<Utc>,
}

/// End date of a cohort starting at `start` and running `total_weeks` weeks
pub fn end_date_for(start: DateTime<Utc>, total_weeks: i32) -> DateTime<Utc> {
    start + Duration::weeks(i64::from(total_weeks))
}

impl Cohort {
    /// 1-based curriculum week containing `at`, clamped to the cohort length
    pub fn week_at(&self, at: DateTime<Utc>) -> i32 {
        if at <= self.start_date {
            return 1;
        }
        let elapsed_weeks = (at - self.start_date).num_weeks() as i32;
        (elapsed_weeks + 1).min(self.total_weeks.max(1))
    }

    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: CreateCohort,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Cohort>(
            r#"
            INSERT INTO cohorts (name, total_weeks, start_date, end_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.name)
        .bind(data.total_weeks)
        .bind(data.start_date)
        .bind(end_date_for(data.start_date, data.total_weeks))
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Cohort>("SELECT * FROM cohorts WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lists all cohorts, newest first
    pub async fn list<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Cohort>("SELECT * FROM cohorts ORDER BY start_date DESC")
            .fetch_all(executor)
            .await
    }

    pub async fn exists<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM cohorts WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cohort(total_weeks: i32) -> Cohort {
        let start = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap();
        Cohort {
            id: Uuid::new_v4(),
            name: "Cohort 4".to_string(),
            total_weeks,
            start_date: start,
            end_date: end_date_for(start, total_weeks),
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn test_end_date_for() {
        let start = Utc.with_ymd_and_hms(2025, 1, 6, 9, 30, 0).unwrap();
        let end = end_date_for(start, 12);
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 31, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_week_at() {
        let c = cohort(4);
        assert_eq!(c.week_at(c.start_date - Duration::days(3)), 1);
        assert_eq!(c.week_at(c.start_date + Duration::days(6)), 1);
        assert_eq!(c.week_at(c.start_date + Duration::days(7)), 2);
        assert_eq!(c.week_at(c.start_date + Duration::days(100)), 4);
    }
}
