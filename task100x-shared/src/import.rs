/// Bulk learner import
///
/// Rows come from a spreadsheet export, so each field also accepts the
/// column header used there ("Email", "Phone Number", "Work Experience", ...).
/// Every row is imported in its own transaction; one bad row never rolls back
/// the others.
///
/// Imported learners have no password hash and cannot log in until a
/// password is set for them.
///
/// # Example
///
/// ```no_run
/// use task100x_shared::import::{import_learners, ImportRequest, OnDuplicate};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let request: ImportRequest = serde_json::from_str(r#"{
///     "on_duplicate": "skip",
///     "rows": [{"Email": "asha@example.com", "Name": "Asha", "Student": "Yes"}]
/// }"#)?;
///
/// let summary = import_learners(&pool, request).await?;
/// println!("{} imported", summary.success_count);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::cohort::Cohort;
use crate::models::launchpad::{Launchpad, LaunchpadProfile};
use crate::models::user::{normalize_email, CreateUser, User, UserRole, CREATED_FROM_IMPORT};

/// Largest number of rows accepted in one request
pub const MAX_IMPORT_ROWS: usize = 5000;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Cohort not found: {0}")]
    CohortNotFound(Uuid),

    #[error("Import contains no rows")]
    Empty,

    #[error("Import contains {rows} rows, the limit is {limit}")]
    TooManyRows { rows: usize, limit: usize },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What to do with a row whose email is already registered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnDuplicate {
    #[default]
    Skip,
    Update,
}

/// One spreadsheet row
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRow {
    #[serde(default, alias = "Email", deserialize_with = "cell")]
    pub email: Option<String>,

    #[serde(default, alias = "Name", deserialize_with = "cell")]
    pub name: Option<String>,

    #[serde(
        default,
        alias = "Phone Number",
        alias = "Phone",
        alias = "phone",
        deserialize_with = "cell"
    )]
    pub phone_number: Option<String>,

    #[serde(default, alias = "Student", deserialize_with = "cell")]
    pub student: Option<String>,

    #[serde(default, alias = "Work Experience", deserialize_with = "cell")]
    pub work_experience: Option<String>,

    #[serde(default, alias = "Study Stream", deserialize_with = "cell")]
    pub study_stream: Option<String>,

    #[serde(default, alias = "Expected Outcomes", deserialize_with = "cell")]
    pub expected_outcomes: Option<String>,

    #[serde(default, alias = "Coding Familiarity", deserialize_with = "cell")]
    pub coding_familiarity: Option<String>,

    #[serde(default, alias = "Python Familiarity", deserialize_with = "cell")]
    pub python_familiarity: Option<String>,

    #[serde(default, alias = "Languages", deserialize_with = "cell")]
    pub languages: Option<String>,

    #[serde(default, alias = "Years of Experience", deserialize_with = "cell")]
    pub years_of_experience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    pub cohort_id: Option<Uuid>,

    #[serde(default)]
    pub on_duplicate: OnDuplicate,

    pub rows: Vec<ImportRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Success,
    Skipped,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowResult {
    pub status: RowStatus,
    pub reason: Option<String>,
    pub email: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total: usize,
    pub success_count: usize,
    pub skipped_count: usize,
    pub failure_count: usize,
    pub results: Vec<RowResult>,
}

impl ImportSummary {
    pub fn from_results(results: Vec<RowResult>) -> Self {
        let count = |status: RowStatus| results.iter().filter(|r| r.status == status).count();

        Self {
            total: results.len(),
            success_count: count(RowStatus::Success),
            skipped_count: count(RowStatus::Skipped),
            failure_count: count(RowStatus::Failure),
            results,
        }
    }
}

/// Accepts strings, numbers and booleans; blank cells become None
fn cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;

    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some((if b { "Yes" } else { "No" }).to_string()),
        _ => None,
    }
    .filter(|s| !s.is_empty()))
}

/// Parses a Yes/No cell, case-insensitively
pub fn parse_yes_no(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        let v = v.trim();
        v.eq_ignore_ascii_case("yes") || v.eq_ignore_ascii_case("y") || v.eq_ignore_ascii_case("true")
    })
}

impl ImportRow {
    /// Normalized email, if the row has one
    pub fn email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty())
    }

    pub fn profile(&self) -> LaunchpadProfile {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();

        LaunchpadProfile {
            is_student: parse_yes_no(self.student.as_deref()),
            work_experience: parse_yes_no(self.work_experience.as_deref()),
            study_stream: text(&self.study_stream),
            expected_outcomes: text(&self.expected_outcomes),
            coding_familiarity: text(&self.coding_familiarity),
            python_familiarity: text(&self.python_familiarity),
            languages: text(&self.languages),
            years_of_experience: text(&self.years_of_experience),
        }
    }
}

fn failure(email: Option<String>, reason: &str) -> RowResult {
    RowResult {
        status: RowStatus::Failure,
        reason: Some(reason.to_string()),
        email,
        user_id: None,
    }
}

/// Imports learners row by row
///
/// # Errors
///
/// Fails as a whole only when the request is unusable (no rows, too many
/// rows, unknown cohort) or the cohort lookup fails. Row-level database
/// errors become failure results.
pub async fn import_learners(
    pool: &PgPool,
    request: ImportRequest,
) -> Result<ImportSummary, ImportError> {
    if request.rows.is_empty() {
        return Err(ImportError::Empty);
    }
    if request.rows.len() > MAX_IMPORT_ROWS {
        return Err(ImportError::TooManyRows {
            rows: request.rows.len(),
            limit: MAX_IMPORT_ROWS,
        });
    }
    if let Some(cohort_id) = request.cohort_id {
        if !Cohort::exists(pool, cohort_id).await? {
            return Err(ImportError::CohortNotFound(cohort_id));
        }
    }

    let mut results = Vec::with_capacity(request.rows.len());
    for row in &request.rows {
        let result = match row.email() {
            None => failure(None, "missing email"),
            Some(email) => {
                match import_row(pool, row, &email, request.cohort_id, request.on_duplicate).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!(email = %email, error = %e, "Learner import row failed");
                        failure(Some(email), "insertion error")
                    }
                }
            }
        };
        results.push(result);
    }

    let summary = ImportSummary::from_results(results);
    tracing::info!(
        total = summary.total,
        success = summary.success_count,
        skipped = summary.skipped_count,
        failed = summary.failure_count,
        "Learner import finished"
    );

    Ok(summary)
}

async fn import_row(
    pool: &PgPool,
    row: &ImportRow,
    email: &str,
    cohort_id: Option<Uuid>,
    on_duplicate: OnDuplicate,
) -> Result<RowResult, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let user = match User::find_by_email(&mut *tx, email).await? {
        Some(existing) if on_duplicate == OnDuplicate::Skip => {
            return Ok(RowResult {
                status: RowStatus::Skipped,
                reason: Some("duplicate".to_string()),
                email: Some(email.to_string()),
                user_id: Some(existing.id),
            });
        }
        Some(existing) if existing.role != UserRole::Learner => {
            return Ok(failure(Some(email.to_string()), "email belongs to an instructor"));
        }
        Some(existing) => User::update_import_fields(
            &mut *tx,
            existing.id,
            row.name.clone(),
            row.phone_number.clone(),
            cohort_id,
        )
        .await?
        .unwrap_or(existing),
        None => {
            User::create(
                &mut *tx,
                CreateUser {
                    email: email.to_string(),
                    password_hash: None,
                    name: row.name.clone(),
                    phone_number: row.phone_number.clone(),
                    role: UserRole::Learner,
                    cohort_id,
                    created_from: CREATED_FROM_IMPORT.to_string(),
                },
            )
            .await?
        }
    };

    Launchpad::upsert(&mut *tx, user.id, &row.profile()).await?;
    tx.commit().await?;

    Ok(RowResult {
        status: RowStatus::Success,
        reason: None,
        email: Some(user.email),
        user_id: Some(user.id),
    })
}
