/// Instructor dashboard metrics for a cohort

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{percent, round2};
use crate::models::streak::Streak;
use crate::models::task::TaskProgressRow;
use crate::models::user::User;

/// Window used for the monthly progress figure
pub const MONTHLY_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerProgress {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_learners: usize,
    pub total_resources: i64,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub completion_percentage: f64,
    pub average_streak: f64,

    /// Completion percentage of tasks assigned in the last 30 days
    pub monthly_progress: f64,

    /// Keyed by learner email
    pub learner_progress: BTreeMap<String, LearnerProgress>,
}

/// Computes dashboard metrics
///
/// `learners` are the plan owners of the cohort and `rows` their tasks.
pub fn dashboard_metrics(
    learners: &[User],
    total_resources: i64,
    rows: &[TaskProgressRow],
    streaks: &[Streak],
    now: DateTime<Utc>,
) -> DashboardMetrics {
    let total_tasks = rows.len();
    let completed_tasks = rows.iter().filter(|r| r.is_completed()).count();

    let window_start = now - Duration::days(MONTHLY_WINDOW_DAYS);
    let (recent_done, recent_total) = rows
        .iter()
        .filter(|r| r.assigned_date >= window_start)
        .fold((0, 0), |(d, t), r| (d + usize::from(r.is_completed()), t + 1));

    let streaks: HashMap<Uuid, i32> = streaks
        .iter()
        .map(|s| (s.user_id, s.current_streak))
        .collect();
    let average_streak = if learners.is_empty() {
        0.0
    } else {
        let sum: i64 = learners
            .iter()
            .map(|l| i64::from(streaks.get(&l.id).copied().unwrap_or(0)))
            .sum();
        round2(sum as f64 / learners.len() as f64)
    };

    let mut counts: HashMap<Uuid, (usize, usize)> = HashMap::new();
    for row in rows {
        let entry = counts.entry(row.user_id).or_default();
        entry.1 += 1;
        if row.is_completed() {
            entry.0 += 1;
        }
    }

    let learner_progress = learners
        .iter()
        .map(|learner| {
            let (completed, total) = counts.get(&learner.id).copied().unwrap_or_default();
            (
                learner.email.clone(),
                LearnerProgress {
                    user_id: learner.id,
                    name: learner.name.clone(),
                    completed_tasks: completed,
                    total_tasks: total,
                    progress: percent(completed, total),
                },
            )
        })
        .collect();

    DashboardMetrics {
        total_learners: learners.len(),
        total_resources,
        total_tasks,
        completed_tasks,
        completion_percentage: percent(completed_tasks, total_tasks),
        average_streak,
        monthly_progress: percent(recent_done, recent_total),
        learner_progress,
    }
}
