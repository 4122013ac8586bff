/// Weekly progress of a single learner over required tasks

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::percent;
use crate::models::task::TaskProgressRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekProgress {
    pub week: i32,
    pub completed_tasks: usize,
    pub total_tasks: usize,

    /// Percentage of the week's required tasks completed
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyProgressReport {
    pub weeks: Vec<WeekProgress>,

    /// Percentage of all required tasks completed
    pub completion_rate: f64,
}

/// Groups required tasks by week, weeks ascending
///
/// Optional tasks are ignored.
pub fn weekly_progress(rows: &[TaskProgressRow]) -> WeeklyProgressReport {
    let mut by_week: BTreeMap<i32, (usize, usize)> = BTreeMap::new();

    for row in rows.iter().filter(|r| !r.is_optional) {
        let entry = by_week.entry(row.week_number).or_default();
        entry.1 += 1;
        if row.is_completed() {
            entry.0 += 1;
        }
    }

    let (completed, total) = by_week
        .values()
        .fold((0, 0), |(c, t), (wc, wt)| (c + wc, t + wt));

    WeeklyProgressReport {
        weeks: by_week
            .into_iter()
            .map(|(week, (completed_tasks, total_tasks))| WeekProgress {
                week,
                completed_tasks,
                total_tasks,
                progress: percent(completed_tasks, total_tasks),
            })
            .collect(),
        completion_rate: percent(completed, total),
    }
}

/// Completion rate over required tasks
pub fn completion_rate<'a>(rows: impl IntoIterator<Item = &'a TaskProgressRow>) -> f64 {
    let (completed, total) = rows
        .into_iter()
        .filter(|r| !r.is_optional)
        .fold((0, 0), |(c, t), r| (c + usize::from(r.is_completed()), t + 1));

    percent(completed, total)
}
