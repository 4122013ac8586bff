/// User model and database operations
///
/// Users are either instructors or learners. Learners belong to at most one
/// cohort and may carry a launchpad profile (see [`super::launchpad`]).
/// Learners created by bulk import have no password hash until one is set.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(320) NOT NULL UNIQUE,
///     password_hash VARCHAR(255),
///     name VARCHAR(255),
///     phone_number VARCHAR(32),
///     role user_role NOT NULL,
///     cohort_id UUID REFERENCES cohorts(id) ON DELETE SET NULL,
///     created_from VARCHAR(32) NOT NULL DEFAULT 'signup',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use task100x_shared::models::user::{CreateUser, User, UserRole};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "learner@example.com".to_string(),
///     password_hash: Some("$argon2id$...".to_string()),
///     name: Some("Asha".to_string()),
///     phone_number: None,
///     role: UserRole::Learner,
///     cohort_id: None,
///     created_from: "signup".to_string(),
/// }).await?;
///
/// let found = User::find_by_email(&pool, "Learner@Example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Manages cohorts, content, quizzes and sessions
    #[serde(alias = "instructor")]
    Instructor,

    /// Follows a plan within a cohort
    #[serde(alias = "learner")]
    Learner,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Instructor => "INSTRUCTOR",
            UserRole::Learner => "LEARNER",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a user account came from
pub const CREATED_FROM_SIGNUP: &str = "signup";
pub const CREATED_FROM_IMPORT: &str = "csv";

/// User model representing a user account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Email address, stored lowercase
    pub email: String,

    /// Argon2id password hash; None for imported learners
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    pub name: Option<String>,

    /// WhatsApp-capable phone number used for session reminders
    pub phone_number: Option<String>,

    pub role: UserRole,

    /// Cohort the user belongs to
    pub cohort_id: Option<Uuid>,

    /// `signup` or `csv`
    pub created_from: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,

    /// Argon2id password hash (NOT a plaintext password)
    pub password_hash: Option<String>,

    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub role: UserRole,
    pub cohort_id: Option<Uuid>,
    pub created_from: String,
}

/// Normalizes an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

const USER_COLUMNS: &str = "id, email, password_hash, name, phone_number, role, cohort_id, \
                            created_from, created_at, updated_at, last_login_at";

impl User {
    /// Display name, falling back to the email address
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }

    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns a unique violation on `users_email_key` when the email is taken.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: CreateUser,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash, name, phone_number, role, cohort_id, created_from)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(&data.email))
            .bind(data.password_hash)
            .bind(data.name)
            .bind(data.phone_number)
            .bind(data.role)
            .bind(data.cohort_id)
            .bind(data.created_from)
            .fetch_one(executor)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email<'e, E: PgExecutor<'e>>(
        executor: E,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(executor)
            .await
    }

    /// Lists learners ordered by name, optionally only those of one cohort
    pub async fn list_learners<'e, E: PgExecutor<'e>>(
        executor: E,
        cohort_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM users
             WHERE role = 'LEARNER' AND ($1::uuid IS NULL OR cohort_id = $1)
             ORDER BY name NULLS LAST, email",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(cohort_id)
            .fetch_all(executor)
            .await
    }

    pub async fn list_by_ids<'e, E: PgExecutor<'e>>(
        executor: E,
        ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    /// Updates the profile fields written by bulk import
    ///
    /// `None` leaves the stored value unchanged.
    pub async fn update_import_fields<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        name: Option<String>,
        phone_number: Option<String>,
        cohort_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users
             SET name = COALESCE($2, name),
                 phone_number = COALESCE($3, phone_number),
                 cohort_id = COALESCE($4, cohort_id),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(name)
            .bind(phone_number)
            .bind(cohort_id)
            .fetch_optional(executor)
            .await
    }

    /// Records a successful login
    pub async fn update_last_login<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "asha@example.com".to_string(),
            password_hash: None,
            name: name.map(String::from),
            phone_number: None,
            role: UserRole::Learner,
            cohort_id: None,
            created_from: CREATED_FROM_IMPORT.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_user_role_serde() {
        assert_eq!(
            serde_json::to_string(&UserRole::Instructor).unwrap(),
            "\"INSTRUCTOR\""
        );
        assert_eq!(
            serde_json::from_str::<UserRole>("\"learner\"").unwrap(),
            UserRole::Learner
        );
        assert_eq!(
            serde_json::from_str::<UserRole>("\"LEARNER\"").unwrap(),
            UserRole::Learner
        );
        assert!(serde_json::from_str::<UserRole>("\"admin\"").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Asha@Example.COM "), "asha@example.com");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(user(Some("Asha")).display_name(), "Asha");
        assert_eq!(user(Some("  ")).display_name(), "asha@example.com");
        assert_eq!(user(None).display_name(), "asha@example.com");
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let mut u = user(Some("Asha"));
        u.password_hash = Some("$argon2id$secret".to_string());

        let json = serde_json::to_value(&u).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "LEARNER");
    }
}
