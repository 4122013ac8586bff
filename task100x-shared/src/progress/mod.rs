/// Learner progress computations
///
/// Everything here works on rows already loaded from the database, so the
/// rules can be tested without PostgreSQL. The one exception is
/// [`streak::complete_task`], which runs the task completion transaction.
///
/// # Modules
///
/// - `streak`: Daily and weekly streak rules and the completion transaction
/// - `weekly`: Per-week progress of one learner
/// - `leaderboard`: Cohort ranking
/// - `dashboard`: Instructor cohort metrics

pub mod dashboard;
pub mod leaderboard;
pub mod streak;
pub mod weekly;

/// Share of `part` in `whole` as a percentage rounded to two decimals
///
/// Returns 0 when `whole` is 0.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
