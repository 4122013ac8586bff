/// Streaks, weekly progress and the leaderboard
///
/// # Endpoints
///
/// - `GET /api/streaks/me` - The caller's streak
/// - `GET /api/progress/weekly?cohort_id=` - The caller's progress per week
/// - `GET /api/leaderboard?cohort_id=` - Ranked learners

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{self, ApiResponse},
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use task100x_shared::{
    auth::{authorization::require_learner, middleware::AuthContext},
    models::{streak::Streak, task::Task, user::User},
    progress::{
        leaderboard::{build_leaderboard, LeaderboardEntry},
        weekly::{weekly_progress as weekly_report, WeeklyProgressReport},
    },
};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct CohortQuery {
    pub cohort_id: Option<Uuid>,
}

/// The cohort named in the query, else the caller's own if they have one
async fn requested_or_own_cohort(
    state: &AppState,
    auth: &AuthContext,
    query: &CohortQuery,
) -> ApiResult<Option<Uuid>> {
    if let Some(cohort_id) = query.cohort_id {
        return Ok(Some(cohort_id));
    }

    Ok(User::find_by_id(&state.db, auth.user_id)
        .await?
        .and_then(|u| u.cohort_id))
}

/// Like [`requested_or_own_cohort`] but a cohort is required
async fn resolve_cohort(state: &AppState, auth: &AuthContext, query: &CohortQuery) -> ApiResult<Uuid> {
    requested_or_own_cohort(state, auth, query)
        .await?
        .ok_or_else(|| ApiError::NotFound("User is not assigned to a cohort".to_string()))
}

/// The caller's streak; all zeros before the first completed task
pub async fn my_streak(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<Streak>>> {
    require_learner(&auth)?;

    let streak = Streak::find_by_user(&state.db, auth.user_id)
        .await?
        .unwrap_or_else(|| Streak::empty(auth.user_id));

    Ok(response::ok(streak))
}

/// Weekly progress over required tasks
///
/// Covers the plans of the requested cohort, or the caller's own cohort.
/// A learner without a cohort gets a report over all of their plans.
///
/// # Endpoint
///
/// ```text
/// GET /api/progress/weekly
/// Authorization: Bearer <learner token>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "weeks": [
///       { "week": 1, "completed_tasks": 4, "total_tasks": 4, "progress": 100.0 },
///       { "week": 2, "completed_tasks": 1, "total_tasks": 3, "progress": 33.33 }
///     ],
///     "completion_rate": 71.43
///   }
/// }
/// ```
pub async fn weekly_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<CohortQuery>,
) -> ApiResult<Json<ApiResponse<WeeklyProgressReport>>> {
    require_learner(&auth)?;
    let cohort_id = requested_or_own_cohort(&state, &auth, &query).await?;

    let rows = Task::progress_rows_for_user(&state.db, auth.user_id, cohort_id).await?;

    Ok(response::ok(weekly_report(&rows)))
}

/// Leaderboard
///
/// Ranks learners by completion rate, then daily streak, then weekly streak,
/// then fastest completion time. Learners see their own cohort unless a
/// `cohort_id` is given; instructors without a cohort see every learner.
///
/// # Endpoint
///
/// ```text
/// GET /api/leaderboard?cohort_id=uuid
/// Authorization: Bearer <token>
/// ```
pub async fn leaderboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<CohortQuery>,
) -> ApiResult<Json<ApiResponse<Vec<LeaderboardEntry>>>> {
    let cohort_id = if auth.is_instructor() {
        query.cohort_id
    } else {
        Some(resolve_cohort(&state, &auth, &query).await?)
    };

    let learners = User::list_learners(&state.db, cohort_id).await?;
    let learner_ids: Vec<Uuid> = learners.iter().map(|l| l.id).collect();
    let rows = Task::progress_rows(&state.db, cohort_id).await?;
    let streaks = Streak::list_by_users(&state.db, &learner_ids).await?;

    Ok(response::ok(build_leaderboard(&learners, &rows, &streaks)))
}
