/// Launchpad model: a learner's onboarding profile
///
/// Captured at import time and used to personalize session reminders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Launchpad {
    pub id: Uuid,
    pub user_id: Uuid,
    pub is_student: bool,
    pub work_experience: bool,
    pub study_stream: String,
    pub expected_outcomes: String,
    pub coding_familiarity: String,
    pub python_familiarity: String,
    pub languages: String,
    pub years_of_experience: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Launchpad fields as written by import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchpadProfile {
    pub is_student: bool,
    pub work_experience: bool,
    pub study_stream: String,
    pub expected_outcomes: String,
    pub coding_familiarity: String,
    pub python_familiarity: String,
    pub languages: String,
    pub years_of_experience: String,
}

impl Launchpad {
    /// Profile part of the row
    pub fn profile(&self) -> LaunchpadProfile {
        LaunchpadProfile {
            is_student: self.is_student,
            work_experience: self.work_experience,
            study_stream: self.study_stream.clone(),
            expected_outcomes: self.expected_outcomes.clone(),
            coding_familiarity: self.coding_familiarity.clone(),
            python_familiarity: self.python_familiarity.clone(),
            languages: self.languages.clone(),
            years_of_experience: self.years_of_experience.clone(),
        }
    }

    /// Creates or replaces the launchpad of a user
    pub async fn upsert<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
        profile: &LaunchpadProfile,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Launchpad>(
            r#"
            INSERT INTO launchpads (user_id, is_student, work_experience, study_stream,
                                    expected_outcomes, coding_familiarity, python_familiarity,
                                    languages, years_of_experience)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE SET
                is_student = EXCLUDED.is_student,
                work_experience = EXCLUDED.work_experience,
                study_stream = EXCLUDED.study_stream,
                expected_outcomes = EXCLUDED.expected_outcomes,
                coding_familiarity = EXCLUDED.coding_familiarity,
                python_familiarity = EXCLUDED.python_familiarity,
                languages = EXCLUDED.languages,
                years_of_experience = EXCLUDED.years_of_experience,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(profile.is_student)
        .bind(profile.work_experience)
        .bind(&profile.study_stream)
        .bind(&profile.expected_outcomes)
        .bind(&profile.coding_familiarity)
        .bind(&profile.python_familiarity)
        .bind(&profile.languages)
        .bind(&profile.years_of_experience)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Launchpad>("SELECT * FROM launchpads WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Launchpads of every learner in a cohort
    pub async fn list_by_cohort<'e, E: PgExecutor<'e>>(
        executor: E,
        cohort_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Launchpad>(
            r#"
            SELECT l.* FROM launchpads l
            JOIN users u ON u.id = l.user_id
            WHERE u.cohort_id = $1
            "#,
        )
        .bind(cohort_id)
        .fetch_all(executor)
        .await
    }
}

impl LaunchpadProfile {
    /// One-line description used in message prompts
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        parts.push(if self.is_student {
            "student".to_string()
        } else {
            "not a student".to_string()
        });
        parts.push(if self.work_experience {
            "has work experience".to_string()
        } else {
            "no work experience".to_string()
        });

        for (label, value) in [
            ("study stream", &self.study_stream),
            ("expected outcomes", &self.expected_outcomes),
            ("coding familiarity", &self.coding_familiarity),
            ("python familiarity", &self.python_familiarity),
            ("languages", &self.languages),
            ("years of experience", &self.years_of_experience),
        ] {
            if !value.trim().is_empty() {
                parts.push(format!("{}: {}", label, value.trim()));
            }
        }

        parts.join("; ")
    }
}
