/// Session reminder notifications
///
/// # State Machine
///
/// ```text
/// PENDING → DRAFT     message generated by the worker
/// DRAFT   → QUEUED    approved by an instructor
/// QUEUED  → SENT      delivered over WhatsApp
/// any     → FAILED    after the last allowed attempt
/// FAILED  → QUEUED    instructor edits the message
/// ```
///
/// The worker picks up PENDING and QUEUED rows whose `next_attempt_at` has
/// passed. DRAFT rows wait for an instructor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::launchpad::LaunchpadProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Pending,
    Draft,
    Queued,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "PENDING",
            NotificationStatus::Draft => "DRAFT",
            NotificationStatus::Queued => "QUEUED",
            NotificationStatus::Sent => "SENT",
            NotificationStatus::Failed => "FAILED",
        }
    }

    /// Whether an instructor may edit the message
    pub fn is_editable(&self) -> bool {
        matches!(self, NotificationStatus::Draft | NotificationStatus::Failed)
    }

    /// Whether the worker has something to do for this status
    pub fn is_actionable(&self) -> bool {
        matches!(self, NotificationStatus::Pending | NotificationStatus::Queued)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub message: Option<String>,
    pub status: NotificationStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub next_attempt_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A notification joined with its learner, launchpad and session
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationContext {
    #[sqlx(flatten)]
    pub notification: Notification,

    pub learner_name: Option<String>,
    pub learner_email: String,
    pub phone_number: Option<String>,

    pub session_title: String,
    pub session_description: String,
    pub scheduled_at: Option<DateTime<Utc>>,

    pub lp_is_student: Option<bool>,
    pub lp_work_experience: Option<bool>,
    pub lp_study_stream: Option<String>,
    pub lp_expected_outcomes: Option<String>,
    pub lp_coding_familiarity: Option<String>,
    pub lp_python_familiarity: Option<String>,
    pub lp_languages: Option<String>,
    pub lp_years_of_experience: Option<String>,
}

/// Notification as listed for an instructor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub learner_name: Option<String>,
    pub learner_email: String,
    pub launchpad: Option<LaunchpadProfile>,
}

impl NotificationContext {
    /// Learner's launchpad, if they have one
    pub fn launchpad(&self) -> Option<LaunchpadProfile> {
        // is_student is NOT NULL in launchpads, so it tells whether the join matched
        let is_student = self.lp_is_student?;

        Some(LaunchpadProfile {
            is_student,
            work_experience: self.lp_work_experience.unwrap_or(false),
            study_stream: self.lp_study_stream.clone().unwrap_or_default(),
            expected_outcomes: self.lp_expected_outcomes.clone().unwrap_or_default(),
            coding_familiarity: self.lp_coding_familiarity.clone().unwrap_or_default(),
            python_familiarity: self.lp_python_familiarity.clone().unwrap_or_default(),
            languages: self.lp_languages.clone().unwrap_or_default(),
            years_of_experience: self.lp_years_of_experience.clone().unwrap_or_default(),
        })
    }

    /// Learner name, falling back to the email address
    pub fn learner_display_name(&self) -> &str {
        self.learner_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.learner_email)
    }

    pub fn into_view(self) -> NotificationView {
        let launchpad = self.launchpad();
        NotificationView {
            notification: self.notification,
            learner_name: self.learner_name,
            learner_email: self.learner_email,
            launchpad,
        }
    }
}

const CONTEXT_SELECT: &str = r#"
    SELECT n.id, n.session_id, n.user_id, n.message, n.status, n.attempts, n.last_error,
           n.next_attempt_at, n.sent_at, n.created_at, n.updated_at,
           u.name AS learner_name, u.email AS learner_email, u.phone_number,
           s.title AS session_title, s.description AS session_description, s.scheduled_at,
           l.is_student AS lp_is_student, l.work_experience AS lp_work_experience,
           l.study_stream AS lp_study_stream, l.expected_outcomes AS lp_expected_outcomes,
           l.coding_familiarity AS lp_coding_familiarity,
           l.python_familiarity AS lp_python_familiarity,
           l.languages AS lp_languages, l.years_of_experience AS lp_years_of_experience
    FROM notifications n
    JOIN users u ON u.id = n.user_id
    JOIN live_sessions s ON s.id = n.session_id
    LEFT JOIN launchpads l ON l.user_id = n.user_id
"#;

impl Notification {
    /// Enqueues a PENDING notification for every learner of the cohort
    ///
    /// Learners that already have one for the session are skipped.
    pub async fn enqueue_for_cohort(
        conn: &mut PgConnection,
        session_id: Uuid,
        cohort_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (session_id, user_id)
            SELECT $1, u.id FROM users u
            WHERE u.cohort_id = $2 AND u.role = 'LEARNER'
            ON CONFLICT (session_id, user_id) DO NOTHING
            "#,
        )
        .bind(session_id)
        .bind(cohort_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Notifications of a session with learner and launchpad details
    pub async fn list_by_session<'e, E: PgExecutor<'e>>(
        executor: E,
        session_id: Uuid,
    ) -> Result<Vec<NotificationContext>, sqlx::Error> {
        let query = format!("{} WHERE n.session_id = $1 ORDER BY u.name NULLS LAST, u.email", CONTEXT_SELECT);

        sqlx::query_as::<_, NotificationContext>(&query)
            .bind(session_id)
            .fetch_all(executor)
            .await
    }

    /// Loads delivery context for the given notifications
    pub async fn contexts_by_ids<'e, E: PgExecutor<'e>>(
        executor: E,
        ids: &[Uuid],
    ) -> Result<Vec<NotificationContext>, sqlx::Error> {
        let query = format!("{} WHERE n.id = ANY($1) ORDER BY n.next_attempt_at", CONTEXT_SELECT);

        sqlx::query_as::<_, NotificationContext>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    /// Replaces the message of an editable notification
    ///
    /// A FAILED notification is re-queued with a fresh attempt budget. Returns
    /// None when the notification is missing or no longer editable.
    pub async fn edit_message<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        message: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET message = $2,
                status = CASE WHEN status = 'FAILED' THEN 'QUEUED'::notification_status ELSE status END,
                attempts = CASE WHEN status = 'FAILED' THEN 0 ELSE attempts END,
                last_error = CASE WHEN status = 'FAILED' THEN NULL ELSE last_error END,
                next_attempt_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status IN ('DRAFT', 'FAILED')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(message)
        .fetch_optional(executor)
        .await
    }

    /// Moves every DRAFT notification of a session to QUEUED
    pub async fn queue_drafts<'e, E: PgExecutor<'e>>(
        executor: E,
        session_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'QUEUED', attempts = 0, next_attempt_at = NOW(), updated_at = NOW()
            WHERE session_id = $1 AND status = 'DRAFT'
            "#,
        )
        .bind(session_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use NotificationStatus::*;

    #[test]
    fn test_editable_statuses() {
        assert!(Draft.is_editable());
        assert!(Failed.is_editable());
        assert!(!Pending.is_editable());
        assert!(!Queued.is_editable());
        assert!(!Sent.is_editable());
    }

    #[test]
    fn test_actionable_statuses() {
        assert!(Pending.is_actionable());
        assert!(Queued.is_actionable());
        assert!(!Draft.is_actionable());
        assert!(!Sent.is_actionable());
        assert!(!Failed.is_actionable());
    }

    fn context(lp_is_student: Option<bool>) -> NotificationContext {
        let now = Utc::now();
        NotificationContext {
            notification: Notification {
                id: Uuid::new_v4(),
                session_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                message: None,
                status: Pending,
                attempts: 0,
                last_error: None,
                next_attempt_at: now,
                sent_at: None,
                created_at: now,
                updated_at: now,
            },
            learner_name: None,
            learner_email: "ravi@example.com".to_string(),
            phone_number: Some("919999999999".to_string()),
            session_title: "Week 2 live".to_string(),
            session_description: "Closures".to_string(),
            scheduled_at: None,
            lp_is_student,
            lp_work_experience: None,
            lp_study_stream: Some("ECE".to_string()),
            lp_expected_outcomes: None,
            lp_coding_familiarity: None,
            lp_python_familiarity: None,
            lp_languages: None,
            lp_years_of_experience: None,
        }
    }

    #[test]
    fn test_launchpad_from_left_join() {
        assert!(context(None).launchpad().is_none());

        let profile = context(Some(true)).launchpad().unwrap();
        assert!(profile.is_student);
        assert!(!profile.work_experience);
        assert_eq!(profile.study_stream, "ECE");
    }

    #[test]
    fn test_view_keeps_learner_fields() {
        let ctx = context(None);
        assert_eq!(ctx.learner_display_name(), "ravi@example.com");

        let view = ctx.into_view();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["learner_email"], "ravi@example.com");
        assert!(json["launchpad"].is_null());
    }
}
