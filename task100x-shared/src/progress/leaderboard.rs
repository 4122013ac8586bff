/// Cohort leaderboard
///
/// Learners are ranked by completion rate, then daily streak, then weekly
/// streak, then by their fastest required-task completion (learners who
/// never completed one come last). Equal learners keep their input order.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::weekly::completion_rate;
use crate::models::streak::Streak;
use crate::models::task::TaskProgressRow;
use crate::models::user::User;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub completion_rate: f64,
    pub daily_streak: i32,
    pub weekly_streak: i32,

    /// Fastest assignment-to-completion time in seconds
    pub shortest_completion_time: Option<i64>,
}

/// Fastest completion among required tasks, in seconds
pub fn shortest_completion_time<'a>(
    rows: impl IntoIterator<Item = &'a TaskProgressRow>,
) -> Option<i64> {
    rows.into_iter()
        .filter(|r| !r.is_optional && r.is_completed())
        .filter_map(|r| r.completed_at.map(|done| (done - r.assigned_date).num_seconds()))
        .min()
}

/// Orders two entries by leaderboard precedence
pub fn compare_entries(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.completion_rate
        .total_cmp(&a.completion_rate)
        .then_with(|| b.daily_streak.cmp(&a.daily_streak))
        .then_with(|| b.weekly_streak.cmp(&a.weekly_streak))
        .then_with(|| match (a.shortest_completion_time, b.shortest_completion_time) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Builds the ranked leaderboard of `learners`
///
/// `rows` and `streaks` may contain other users; they are ignored.
pub fn build_leaderboard(
    learners: &[User],
    rows: &[TaskProgressRow],
    streaks: &[Streak],
) -> Vec<LeaderboardEntry> {
    let mut rows_by_user: HashMap<Uuid, Vec<&TaskProgressRow>> = HashMap::new();
    for row in rows {
        rows_by_user.entry(row.user_id).or_default().push(row);
    }
    let streaks: HashMap<Uuid, &Streak> = streaks.iter().map(|s| (s.user_id, s)).collect();

    let mut entries: Vec<LeaderboardEntry> = learners
        .iter()
        .map(|learner| {
            let own = rows_by_user.get(&learner.id).map(Vec::as_slice).unwrap_or(&[]);
            let streak = streaks.get(&learner.id);

            LeaderboardEntry {
                rank: 0,
                user_id: learner.id,
                name: learner.name.clone(),
                email: learner.email.clone(),
                completion_rate: completion_rate(own.iter().copied()),
                daily_streak: streak.map_or(0, |s| s.current_streak),
                weekly_streak: streak.map_or(0, |s| s.weekly_streak),
                shortest_completion_time: shortest_completion_time(own.iter().copied()),
            }
        })
        .collect();

    entries.sort_by(compare_entries);
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index + 1;
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskStatus;
    use crate::models::user::UserRole;
    use chrono::{Duration, Utc};

    fn learner(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: None,
            name: None,
            phone_number: None,
            role: UserRole::Learner,
            cohort_id: None,
            created_from: "signup".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    fn done(user_id: Uuid, seconds: i64) -> TaskProgressRow {
        let assigned = Utc::now() - Duration::days(2);
        TaskProgressRow {
            user_id,
            week_number: 1,
            is_optional: false,
            status: TaskStatus::Completed,
            assigned_date: assigned,
            completed_at: Some(assigned + Duration::seconds(seconds)),
        }
    }

    fn pending(user_id: Uuid) -> TaskProgressRow {
        TaskProgressRow {
            user_id,
            week_number: 1,
            is_optional: false,
            status: TaskStatus::Pending,
            assigned_date: Utc::now(),
            completed_at: None,
        }
    }

    fn streak(user_id: Uuid, daily: i32, weekly: i32) -> Streak {
        Streak {
            current_streak: daily,
            longest_streak: daily,
            weekly_streak: weekly,
            ..Streak::empty(user_id)
        }
    }

    #[test]
    fn test_orders_by_rate_then_streaks_then_time() {
        let a = learner("a@example.com");
        let b = learner("b@example.com");
        let c = learner("c@example.com");
        let d = learner("d@example.com");

        let rows = vec![
            done(a.id, 100),
            pending(a.id),
            done(b.id, 500),
            done(c.id, 50),
            done(d.id, 30),
        ];
        let streaks = vec![streak(b.id, 3, 1), streak(c.id, 3, 1), streak(d.id, 3, 2)];

        let board = build_leaderboard(&[a.clone(), b.clone(), c.clone(), d.clone()], &rows, &streaks);
        let order: Vec<Uuid> = board.iter().map(|e| e.user_id).collect();

        // d wins on weekly streak, c beats b on time, a has the lowest rate
        assert_eq!(order, vec![d.id, c.id, b.id, a.id]);
        assert_eq!(board.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(board[3].completion_rate, 50.0);
        assert_eq!(board[1].shortest_completion_time, Some(50));
    }

    #[test]
    fn test_missing_time_sorts_last_and_ties_are_stable() {
        let a = learner("a@example.com");
        let b = learner("b@example.com");
        let c = learner("c@example.com");

        let rows = vec![pending(a.id), pending(b.id), pending(c.id)];
        let board = build_leaderboard(&[a.clone(), b.clone(), c.clone()], &rows, &[]);
        let order: Vec<Uuid> = board.iter().map(|e| e.user_id).collect();
        assert_eq!(order, vec![a.id, b.id, c.id]);

        let with_time = LeaderboardEntry {
            shortest_completion_time: Some(10),
            ..board[0].clone()
        };
        assert_eq!(compare_entries(&with_time, &board[1]), Ordering::Less);
    }

    #[test]
    fn test_learner_without_rows_or_streak() {
        let a = learner("a@example.com");
        let board = build_leaderboard(&[a.clone()], &[], &[]);

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].completion_rate, 0.0);
        assert_eq!(board[0].daily_streak, 0);
        assert_eq!(board[0].shortest_completion_time, None);
    }
}
