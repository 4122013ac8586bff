/// Streak engine
///
/// Daily streaks count consecutive UTC calendar days with at least one task
/// completion. Weekly streaks count weeks whose required tasks were all
/// completed within [`WEEK_DEADLINE_DAYS`] of assignment.
///
/// The rules are pure functions over a [`Streak`] row. [`complete_task`]
/// applies them while holding the learner's streak row lock, so two
/// completions racing for the same learner are applied one after the other.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use task100x_shared::models::streak::Streak;
/// use task100x_shared::progress::streak::apply_daily;
/// use uuid::Uuid;
///
/// let mut streak = Streak::empty(Uuid::new_v4());
/// apply_daily(&mut streak, Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
/// apply_daily(&mut streak, Utc.with_ymd_and_hms(2025, 3, 2, 23, 0, 0).unwrap());
/// assert_eq!(streak.current_streak, 2);
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::streak::Streak;
use crate::models::task::{Task, TaskProgressRow, TaskStatus};

/// Days a required task may take before its week counts as broken
pub const WEEK_DEADLINE_DAYS: i64 = 7;

/// State of one week's required tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekOutcome {
    /// Every required task was completed within the deadline
    OnTime,

    /// A required task was completed late or is pending past the deadline
    Broken,

    /// Required tasks remain pending within their deadline
    InProgress,
}

/// Classifies a week from its required task rows
///
/// An empty slice (a week with only optional tasks) is `InProgress` and
/// never moves the weekly streak.
pub fn evaluate_week(required: &[TaskProgressRow], now: DateTime<Utc>) -> WeekOutcome {
    if required.is_empty() {
        return WeekOutcome::InProgress;
    }

    let deadline = Duration::days(WEEK_DEADLINE_DAYS);
    let mut all_done = true;

    for row in required {
        match (row.status, row.completed_at) {
            (TaskStatus::Completed, Some(done)) => {
                if done - row.assigned_date > deadline {
                    return WeekOutcome::Broken;
                }
            }
            _ => {
                if now - row.assigned_date > deadline {
                    return WeekOutcome::Broken;
                }
                all_done = false;
            }
        }
    }

    if all_done {
        WeekOutcome::OnTime
    } else {
        WeekOutcome::InProgress
    }
}

/// Applies one completion at `completed_at` to the daily streak
pub fn apply_daily(streak: &mut Streak, completed_at: DateTime<Utc>) {
    let today = completed_at.date_naive();

    match streak.last_completed_date.map(|d| d.date_naive()) {
        None => streak.current_streak = 1,
        Some(last) if today == last => {
            if streak.current_streak == 0 {
                streak.current_streak = 1;
            }
        }
        // Completion stamped before the last one; nothing to extend
        Some(last) if today < last => {}
        Some(last) if (today - last).num_days() == 1 => streak.current_streak += 1,
        Some(_) => streak.current_streak = 1,
    }

    let latest = match streak.last_completed_date {
        Some(last) if last > completed_at => last,
        _ => completed_at,
    };
    streak.last_completed_date = Some(latest);
    streak.longest_streak = streak.longest_streak.max(streak.current_streak);
}

/// Applies a week's outcome to the weekly streak
///
/// A week is awarded at most once.
pub fn apply_weekly(streak: &mut Streak, week_number: i32, outcome: WeekOutcome) {
    match outcome {
        WeekOutcome::OnTime => {
            let already_awarded = streak
                .last_weekly_streak_awarded_week
                .is_some_and(|awarded| awarded >= week_number);

            if !already_awarded {
                streak.weekly_streak += 1;
                streak.last_weekly_streak_awarded_week = Some(week_number);
            }
        }
        WeekOutcome::Broken => streak.weekly_streak = 0,
        WeekOutcome::InProgress => {}
    }
}

/// Result of completing a task
#[derive(Debug, Clone, Serialize)]
pub struct TaskCompletion {
    pub task_id: Uuid,
    pub completed_at: Option<DateTime<Utc>>,

    /// False when the task was already completed and nothing changed
    pub newly_completed: bool,

    pub streak: Streak,
}

/// Completes a learner's task and updates their streak in one transaction
///
/// Returns `Ok(None)` when the task does not exist or belongs to another
/// learner. Completing an already completed task changes nothing.
pub async fn complete_task(
    pool: &PgPool,
    user_id: Uuid,
    task_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<TaskCompletion>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(task) = Task::find_owned_for_update(&mut tx, task_id, user_id).await? else {
        return Ok(None);
    };

    if !task.status.can_transition_to(TaskStatus::Completed) {
        let streak = Streak::find_by_user(&mut *tx, user_id)
            .await?
            .unwrap_or_else(|| Streak::empty(user_id));
        tx.commit().await?;

        return Ok(Some(TaskCompletion {
            task_id,
            completed_at: task.completed_at,
            newly_completed: false,
            streak,
        }));
    }

    let mut streak = Streak::lock(&mut tx, user_id).await?;
    let completed = Task::mark_completed(&mut *tx, task_id, now).await?;

    let required: Vec<TaskProgressRow> =
        Task::progress_rows_for_user(&mut *tx, user_id, Some(task.cohort_id))
            .await?
            .into_iter()
            .filter(|row| row.week_number == task.week_number && !row.is_optional)
            .collect();

    apply_daily(&mut streak, now);
    if !task.is_optional {
        apply_weekly(&mut streak, task.week_number, evaluate_week(&required, now));
    }

    let streak = Streak::save(&mut tx, &streak).await?;
    tx.commit().await?;

    tracing::info!(
        user_id = %user_id,
        task_id = %task_id,
        current_streak = streak.current_streak,
        weekly_streak = streak.weekly_streak,
        "Task completed"
    );

    Ok(Some(TaskCompletion {
        task_id,
        completed_at: completed.and_then(|t| t.completed_at).or(Some(now)),
        newly_completed: true,
        streak,
    }))
}
