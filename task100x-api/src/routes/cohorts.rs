/// Cohort endpoints
///
/// # Endpoints
///
/// - `GET /api/cohorts` - List cohorts
/// - `POST /api/cohorts` - Create a cohort (instructor)
/// - `GET /api/cohorts/current` - The caller's cohort
/// - `GET /api/cohorts/:id/users` - Learners of a cohort (instructor)
/// - `GET /api/dashboard/:cohort_id` - Cohort metrics (instructor)

use std::collections::HashMap;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{self, ApiResponse},
    routes::learners::LearnerView,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use task100x_shared::{
    auth::{authorization::require_instructor, middleware::AuthContext},
    models::{
        cohort::{Cohort, CreateCohort},
        launchpad::Launchpad,
        plan::Plan,
        resource::Resource,
        streak::Streak,
        task::Task,
        user::User,
    },
    progress::dashboard::{dashboard_metrics, DashboardMetrics},
};
use uuid::Uuid;
use validator::Validate;

/// Create cohort request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCohortRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(range(min = 1, max = 52, message = "Total weeks must be between 1 and 52"))]
    pub total_weeks: i32,

    /// Defaults to now
    pub start_date: Option<DateTime<Utc>>,
}

/// A cohort with the curriculum week it is currently in
#[derive(Debug, Serialize)]
pub struct CurrentCohort {
    #[serde(flatten)]
    pub cohort: Cohort,
    pub current_week: i32,
}

pub async fn list_cohorts(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<Vec<Cohort>>>> {
    let cohorts = Cohort::list(&state.db).await?;
    Ok(response::ok(cohorts))
}

/// Create a cohort
///
/// # Endpoint
///
/// ```text
/// POST /api/cohorts
/// Authorization: Bearer <instructor token>
///
/// {
///   "name": "Cohort 5",
///   "total_weeks": 12,
///   "start_date": "2025-01-06T00:00:00Z"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the cohort; `end_date` is `start_date + total_weeks` weeks.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an instructor
/// - `422 Unprocessable Entity`: Empty name, or weeks outside 1..=52
pub async fn create_cohort(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCohortRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Cohort>>)> {
    require_instructor(&auth)?;
    req.validate()?;

    let cohort = Cohort::create(
        &state.db,
        CreateCohort {
            name: req.name.trim().to_string(),
            total_weeks: req.total_weeks,
            start_date: req.start_date.unwrap_or_else(Utc::now),
        },
    )
    .await?;

    tracing::info!(cohort_id = %cohort.id, instructor_id = %auth.user_id, "Cohort created");

    Ok(response::created(cohort, "Cohort created successfully"))
}

/// The cohort the caller belongs to
///
/// # Errors
///
/// - `404 Not Found`: The caller has no cohort, or it was deleted
pub async fn current_cohort(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<CurrentCohort>>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let cohort_id = user
        .cohort_id
        .ok_or_else(|| ApiError::NotFound("User is not assigned to a cohort".to_string()))?;

    let cohort = Cohort::find_by_id(&state.db, cohort_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Cohort not found".to_string()))?;

    let current_week = cohort.week_at(Utc::now());
    Ok(response::ok(CurrentCohort {
        cohort,
        current_week,
    }))
}

/// Learners of a cohort with their launchpad profiles
pub async fn cohort_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(cohort_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<LearnerView>>>> {
    require_instructor(&auth)?;

    if !Cohort::exists(&state.db, cohort_id).await? {
        return Err(ApiError::NotFound("Cohort not found".to_string()));
    }

    let learners = User::list_learners(&state.db, Some(cohort_id)).await?;
    let launchpads: HashMap<Uuid, Launchpad> = Launchpad::list_by_cohort(&state.db, cohort_id)
        .await?
        .into_iter()
        .map(|l| (l.user_id, l))
        .collect();

    let views = learners
        .into_iter()
        .map(|user| {
            let launchpad = launchpads.get(&user.id);
            LearnerView::new(user, launchpad)
        })
        .collect();

    Ok(response::ok(views))
}

/// Cohort dashboard
///
/// # Endpoint
///
/// ```text
/// GET /api/dashboard/:cohort_id
/// Authorization: Bearer <instructor token>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "total_learners": 24,
///     "total_resources": 60,
///     "total_tasks": 480,
///     "completed_tasks": 301,
///     "completion_percentage": 62.71,
///     "average_streak": 3.5,
///     "monthly_progress": 55.0,
///     "learner_progress": {
///       "asha@example.com": { "user_id": "uuid", "name": "Asha", "completed_tasks": 14, "total_tasks": 20, "progress": 70.0 }
///     }
///   }
/// }
/// ```
///
/// Learners are the owners of a plan in the cohort. Percentages are 0 when
/// there is nothing to divide by.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(cohort_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<DashboardMetrics>>> {
    require_instructor(&auth)?;

    if !Cohort::exists(&state.db, cohort_id).await? {
        return Err(ApiError::NotFound("Cohort not found".to_string()));
    }

    let learner_ids = Plan::learner_ids(&state.db, cohort_id).await?;
    let learners = User::list_by_ids(&state.db, &learner_ids).await?;
    let total_resources = Resource::count_by_cohort(&state.db, cohort_id).await?;
    let rows = Task::progress_rows(&state.db, Some(cohort_id)).await?;
    let streaks = Streak::list_by_users(&state.db, &learner_ids).await?;

    let metrics = dashboard_metrics(&learners, total_resources, &rows, &streaks, Utc::now());

    Ok(response::ok(metrics))
}
