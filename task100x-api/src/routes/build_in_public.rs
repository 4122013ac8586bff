/// Build-in-public engagement
///
/// Learners post about their progress on LinkedIn; posts are recorded here
/// and turned into per-user totals, posting streaks, ranks and heatmaps.
///
/// # Endpoints
///
/// - `POST /api/build-in-public/posts` - Record or refresh a post (instructor)
/// - `GET /api/build-in-public/users` - Learners with post totals
/// - `GET /api/build-in-public/users/:id/name` - Display name of a user
/// - `GET /api/build-in-public/users/:id/analytics` - Totals, streaks and rank
/// - `GET /api/build-in-public/users/:id/heatmap?start_date=&end_date=` - Posts per day

use std::collections::BTreeMap;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{self, ApiResponse},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use task100x_shared::{
    auth::{authorization::require_instructor, middleware::AuthContext},
    engagement::{self, EngagementError, UserAnalytics},
    models::{
        post::{Post, PostAuthorSummary, UpsertPost},
        user::User,
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct HeatmapQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct UserName {
    pub id: Uuid,
    pub name: String,
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

async fn find_user(state: &AppState, user_id: Uuid) -> ApiResult<User> {
    User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Record a post
///
/// Posts are keyed by URL; sending the same URL again refreshes its content
/// and engagement counts.
///
/// # Endpoint
///
/// ```text
/// POST /api/build-in-public/posts
/// Authorization: Bearer <instructor token>
///
/// {
///   "user_id": "uuid",
///   "url": "https://www.linkedin.com/posts/asha_day-12",
///   "content": "Day 12 of #100xDevs",
///   "num_likes": 42,
///   "num_comments": 3,
///   "posted_at": "2025-02-01T09:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Unknown user
/// - `403 Forbidden`: Caller is not an instructor
pub async fn upsert_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpsertPost>,
) -> ApiResult<Json<ApiResponse<Post>>> {
    require_instructor(&auth)?;
    req.validate()?;

    let post = Post::upsert(&state.db, &req).await?;

    tracing::debug!(post_id = %post.id, user_id = %post.user_id, "Post recorded");

    Ok(response::ok_with(post, "Post saved"))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<Vec<PostAuthorSummary>>>> {
    let users = Post::author_summaries(&state.db).await?;
    Ok(response::ok(users))
}

pub async fn user_name(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<UserName>>> {
    let user = find_user(&state, user_id).await?;

    Ok(response::ok(UserName {
        id: user.id,
        name: user.display_name().to_string(),
    }))
}

/// Engagement analytics of one user
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "user_id": "uuid",
///     "total_posts": 18,
///     "total_likes": 640,
///     "total_comments": 51,
///     "last_posted": "2025-02-01T09:00:00Z",
///     "current_streak": 4,
///     "longest_streak": 9,
///     "rank": 2
///   }
/// }
/// ```
pub async fn user_analytics(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<UserAnalytics>>> {
    find_user(&state, user_id).await?;

    let totals = Post::totals(&state.db).await?;
    let posted_at = Post::posted_dates(&state.db, user_id).await?;

    Ok(response::ok(engagement::user_analytics(
        user_id,
        &totals,
        &posted_at,
        Utc::now().date_naive(),
    )))
}

/// Posts per day within an inclusive date range
///
/// Days without posts are omitted.
///
/// # Errors
///
/// - `400 Bad Request`: `start_date` is after `end_date`
pub async fn user_heatmap(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<HeatmapQuery>,
) -> ApiResult<Json<ApiResponse<BTreeMap<String, usize>>>> {
    if query.start_date > query.end_date {
        return Err(EngagementError::InvalidRange {
            start: query.start_date,
            end: query.end_date,
        }
        .into());
    }
    let day_after_end = query
        .end_date
        .succ_opt()
        .ok_or_else(|| ApiError::BadRequest("end_date is out of range".to_string()))?;

    find_user(&state, user_id).await?;

    let posted_at = Post::posted_dates_between(
        &state.db,
        user_id,
        start_of_day(query.start_date),
        start_of_day(day_after_end),
    )
    .await?;

    let counts = engagement::heatmap(&posted_at, query.start_date, query.end_date)?;

    Ok(response::ok(counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_start_of_day_is_utc_midnight() {
        let day = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert_eq!(
            start_of_day(day),
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_heatmap_query_parses_iso_dates() {
        let query: HeatmapQuery = serde_json::from_value(serde_json::json!({
            "start_date": "2025-02-01",
            "end_date": "2025-02-28"
        }))
        .unwrap();

        assert_eq!(query.end_date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }
}
