/// Database models for Task 100x
///
/// Each model owns its SQL. Queries that may run inside a transaction take a
/// generic `PgExecutor`; multi-statement writes take `&mut PgConnection` and
/// expect the caller to hold the transaction.
///
/// # Models
///
/// - `user`: Accounts and roles
/// - `launchpad`: Learner onboarding profiles
/// - `cohort`: Multi-week curricula
/// - `resource`: Weekly learning content
/// - `plan` / `task`: A learner's assigned resources
/// - `streak`: Daily and weekly completion streaks
/// - `quiz` / `quiz_attempt`: Weekly quizzes and graded attempts
/// - `session` / `notification`: Live sessions and their WhatsApp reminders
/// - `post`: Build-in-public posts
///
/// # Example
///
/// ```no_run
/// use task100x_shared::models::cohort::{Cohort, CreateCohort};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let cohort = Cohort::create(&pool, CreateCohort {
///     name: "Cohort 5".to_string(),
///     total_weeks: 12,
///     start_date: chrono::Utc::now(),
/// }).await?;
/// println!("cohort ends {}", cohort.end_date);
/// # Ok(())
/// # }
/// ```

pub mod cohort;
pub mod launchpad;
pub mod notification;
pub mod plan;
pub mod post;
pub mod quiz;
pub mod quiz_attempt;
pub mod resource;
pub mod session;
pub mod streak;
pub mod task;
pub mod user;
