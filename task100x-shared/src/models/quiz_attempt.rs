/// Quiz attempts, their answers and feedback reports
///
/// An attempt is written once, together with its graded answers and its
/// feedback report, inside a single transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use crate::scoring::GradedAttempt;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub learner_id: Uuid,

    /// Percentage of multiple-choice questions answered correctly; None when
    /// the quiz has no multiple-choice questions
    pub score: Option<f64>,

    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct QuizAnswer {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub selected_option_id: Option<Uuid>,
    pub answer_text: Option<String>,

    /// None for free-text answers
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedbackReport {
    pub id: Uuid,
    pub quiz_attempt_id: Uuid,
    pub feedback_text: String,
    pub created_at: DateTime<Utc>,
}

/// Attempt status of a learner for one quiz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    /// No attempt submitted
    NotAttempted,

    /// Submitted, but nothing could be scored automatically
    InProgress { attempt_id: Uuid },

    /// Submitted and scored
    Completed { attempt_id: Uuid, score: f64 },
}

impl AttemptStatus {
    /// Status derived from the learner's latest attempt
    pub fn from_latest(attempt: Option<&QuizAttempt>) -> Self {
        match attempt {
            None => AttemptStatus::NotAttempted,
            Some(a) => match a.score {
                Some(score) => AttemptStatus::Completed {
                    attempt_id: a.id,
                    score,
                },
                None => AttemptStatus::InProgress { attempt_id: a.id },
            },
        }
    }
}

impl QuizAttempt {
    /// Stores a graded attempt with its answers and feedback
    ///
    /// Call inside a transaction.
    pub async fn create(
        conn: &mut PgConnection,
        quiz_id: Uuid,
        learner_id: Uuid,
        graded: &GradedAttempt,
        feedback_text: &str,
    ) -> Result<(Self, Vec<QuizAnswer>), sqlx::Error> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(
            r#"
            INSERT INTO quiz_attempts (quiz_id, learner_id, score)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(quiz_id)
        .bind(learner_id)
        .bind(graded.score)
        .fetch_one(&mut *conn)
        .await?;

        let mut answers = Vec::with_capacity(graded.answers.len());
        for answer in &graded.answers {
            let row = sqlx::query_as::<_, QuizAnswer>(
                r#"
                INSERT INTO quiz_answers (attempt_id, question_id, selected_option_id, answer_text, is_correct)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(attempt.id)
            .bind(answer.question_id)
            .bind(answer.selected_option_id)
            .bind(&answer.answer_text)
            .bind(answer.is_correct)
            .fetch_one(&mut *conn)
            .await?;
            answers.push(row);
        }

        sqlx::query("INSERT INTO feedback_reports (quiz_attempt_id, feedback_text) VALUES ($1, $2)")
            .bind(attempt.id)
            .bind(feedback_text)
            .execute(&mut *conn)
            .await?;

        Ok((attempt, answers))
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, QuizAttempt>("SELECT * FROM quiz_attempts WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Latest attempt of a learner on a quiz
    pub async fn latest_for<'e, E: PgExecutor<'e>>(
        executor: E,
        learner_id: Uuid,
        quiz_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, QuizAttempt>(
            r#"
            SELECT * FROM quiz_attempts
            WHERE learner_id = $1 AND quiz_id = $2
            ORDER BY submitted_at DESC
            LIMIT 1
            "#,
        )
        .bind(learner_id)
        .bind(quiz_id)
        .fetch_optional(executor)
        .await
    }
}

impl FeedbackReport {
    pub async fn find_by_attempt<'e, E: PgExecutor<'e>>(
        executor: E,
        attempt_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, FeedbackReport>(
            "SELECT * FROM feedback_reports WHERE quiz_attempt_id = $1",
        )
        .bind(attempt_id)
        .fetch_optional(executor)
        .await
    }
}
