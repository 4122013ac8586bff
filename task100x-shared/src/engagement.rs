/// Build-in-public engagement analytics
///
/// Posting streaks count consecutive UTC calendar days with at least one
/// post. The current streak is the run ending on the most recent posting day,
/// and only while that day is today or yesterday.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use task100x_shared::engagement::heatmap;
///
/// let posts = vec![
///     Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2025, 2, 1, 18, 0, 0).unwrap(),
/// ];
/// let start = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
///
/// let map = heatmap(&posts, start, end).unwrap();
/// assert_eq!(map["2025-02-01"], 2);
/// ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::post::PostTotals;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngagementError {
    #[error("Start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingStreak {
    pub current: u32,
    pub longest: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnalytics {
    pub user_id: Uuid,
    pub total_posts: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub last_posted: Option<DateTime<Utc>>,
    pub current_streak: u32,
    pub longest_streak: u32,

    /// 1-based rank by total posts; users with equal totals share a rank
    pub rank: usize,
}

/// Computes current and longest posting streaks
pub fn posting_streak(posted_at: &[DateTime<Utc>], today: NaiveDate) -> PostingStreak {
    let days: BTreeSet<NaiveDate> = posted_at.iter().map(|d| d.date_naive()).collect();

    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in &days {
        run = match previous {
            Some(prev) if (*day - prev).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    let current = match previous {
        Some(last) if (today - last).num_days() <= 1 => run,
        _ => 0,
    };

    PostingStreak { current, longest }
}

/// Competition rank of a user by total posts
///
/// Users without posts rank after everyone who has posted.
pub fn rank_by_posts(totals: &[PostTotals], user_id: Uuid) -> usize {
    let own = totals
        .iter()
        .find(|t| t.user_id == user_id)
        .map_or(0, |t| t.total_posts);

    1 + totals.iter().filter(|t| t.total_posts > own).count()
}

/// Post counts per `YYYY-MM-DD` day within `[start, end]`
pub fn heatmap(
    posted_at: &[DateTime<Utc>],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BTreeMap<String, usize>, EngagementError> {
    if start > end {
        return Err(EngagementError::InvalidRange { start, end });
    }

    let mut counts = BTreeMap::new();
    for day in posted_at.iter().map(|d| d.date_naive()) {
        if day >= start && day <= end {
            *counts.entry(day.format("%Y-%m-%d").to_string()).or_insert(0) += 1;
        }
    }

    Ok(counts)
}

/// Analytics of one user from everyone's totals and their own post dates
pub fn user_analytics(
    user_id: Uuid,
    totals: &[PostTotals],
    posted_at: &[DateTime<Utc>],
    today: NaiveDate,
) -> UserAnalytics {
    let own = totals.iter().find(|t| t.user_id == user_id);
    let streak = posting_streak(posted_at, today);

    UserAnalytics {
        user_id,
        total_posts: own.map_or(0, |t| t.total_posts),
        total_likes: own.map_or(0, |t| t.total_likes),
        total_comments: own.map_or(0, |t| t.total_comments),
        last_posted: own.and_then(|t| t.last_posted),
        current_streak: streak.current,
        longest_streak: streak.longest,
        rank: rank_by_posts(totals, user_id),
    }
}
