/// Weekly learning resources
///
/// # Endpoints
///
/// - `POST /api/resources` - Add one resource to a week (instructor)
/// - `GET /api/resources/all_by_cohort/:cohort_id` - Every resource, grouped by week
/// - `GET /api/resources/:cohort_id/:week` - Resources of one week
/// - `POST /api/resources/:cohort_id/:week` - Replace a week's resources (instructor)
/// - `DELETE /api/resources/:cohort_id/:week` - Delete a week's resources (instructor)
/// - `DELETE /api/resources/:resource_id` - Delete one resource (instructor)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{self, ApiResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use task100x_shared::{
    auth::{authorization::require_instructor, middleware::AuthContext},
    models::{
        cohort::Cohort,
        resource::{group_by_week, NewResource, Resource, WeekResources},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create resource request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateResourceRequest {
    pub cohort_id: Uuid,

    #[validate(range(min = 1, message = "Week number must be positive"))]
    pub week_number: i32,

    #[serde(flatten)]
    #[validate(nested)]
    pub resource: NewResource,
}

#[derive(Debug, Serialize)]
pub struct DeletedCount {
    pub deleted: u64,
}

fn check_week(week_number: i32) -> ApiResult<()> {
    if week_number < 1 {
        return Err(ApiError::BadRequest(
            "Week number must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Refuses a delete that would take learners' completed tasks with it
fn ensure_no_completed_tasks(completed: i64) -> ApiResult<()> {
    if completed > 0 {
        return Err(ApiError::Conflict(format!(
            "{} completed task(s) reference these resources and would be lost",
            completed
        )));
    }
    Ok(())
}

async fn ensure_cohort(state: &AppState, cohort_id: Uuid) -> ApiResult<()> {
    if Cohort::exists(&state.db, cohort_id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound("Cohort not found".to_string()))
    }
}

/// Add a resource to a cohort week
///
/// # Endpoint
///
/// ```text
/// POST /api/resources
/// Authorization: Bearer <instructor token>
///
/// {
///   "cohort_id": "uuid",
///   "week_number": 2,
///   "title": "Ownership in Rust",
///   "url": "https://example.com/ownership",
///   "type": "VIDEO",
///   "duration": 25,
///   "tags": ["rust"],
///   "is_optional": false
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an instructor
/// - `404 Not Found`: Cohort does not exist
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_resource(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateResourceRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Resource>>)> {
    require_instructor(&auth)?;
    req.validate()?;
    ensure_cohort(&state, req.cohort_id).await?;

    let resource = Resource::create(&state.db, req.cohort_id, req.week_number, &req.resource).await?;

    tracing::info!(
        resource_id = %resource.id,
        cohort_id = %resource.cohort_id,
        week = resource.week_number,
        "Resource created"
    );

    Ok(response::created(resource, "Resource created successfully"))
}

/// All resources of a cohort, grouped by week in ascending order
pub async fn all_by_cohort(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(cohort_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<WeekResources>>>> {
    ensure_cohort(&state, cohort_id).await?;

    let resources = Resource::list_by_cohort(&state.db, cohort_id).await?;
    Ok(response::ok(group_by_week(resources)))
}

pub async fn week_resources(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path((cohort_id, week_number)): Path<(Uuid, i32)>,
) -> ApiResult<Json<ApiResponse<Vec<Resource>>>> {
    check_week(week_number)?;

    let resources = Resource::list_by_week(&state.db, cohort_id, week_number).await?;
    Ok(response::ok(resources))
}

/// Replace every resource of a week
///
/// The week's existing resources are deleted and the given list inserted in
/// one transaction, so readers never see a half-replaced week.
///
/// # Endpoint
///
/// ```text
/// POST /api/resources/:cohort_id/:week
/// Authorization: Bearer <instructor token>
///
/// [
///   { "title": "Intro", "url": "https://example.com/a", "type": "ARTICLE", "duration": 10 },
///   { "title": "Deep dive", "url": "https://example.com/b", "type": "VIDEO", "duration": 40, "is_optional": true }
/// ]
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an instructor
/// - `404 Not Found`: Cohort does not exist
/// - `409 Conflict`: Learners have completed tasks on the week's resources
/// - `422 Unprocessable Entity`: A resource failed validation
pub async fn replace_week(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((cohort_id, week_number)): Path<(Uuid, i32)>,
    Json(resources): Json<Vec<NewResource>>,
) -> ApiResult<Json<ApiResponse<Vec<Resource>>>> {
    require_instructor(&auth)?;
    check_week(week_number)?;
    for resource in &resources {
        resource.validate()?;
    }
    ensure_cohort(&state, cohort_id).await?;

    let mut tx = state.db.begin().await?;
    ensure_no_completed_tasks(
        Resource::completed_task_count_for_week(&mut *tx, cohort_id, week_number).await?,
    )?;
    let created = Resource::replace_week(&mut tx, cohort_id, week_number, &resources).await?;
    tx.commit().await?;

    tracing::info!(
        cohort_id = %cohort_id,
        week = week_number,
        count = created.len(),
        "Week resources replaced"
    );

    Ok(response::ok_with(created, "Week resources updated"))
}

/// Delete every resource of a week
///
/// # Errors
///
/// - `409 Conflict`: Learners have completed tasks on the week's resources
pub async fn delete_week(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((cohort_id, week_number)): Path<(Uuid, i32)>,
) -> ApiResult<Json<ApiResponse<DeletedCount>>> {
    require_instructor(&auth)?;
    check_week(week_number)?;

    let mut tx = state.db.begin().await?;
    ensure_no_completed_tasks(
        Resource::completed_task_count_for_week(&mut *tx, cohort_id, week_number).await?,
    )?;
    let deleted = Resource::delete_week(&mut *tx, cohort_id, week_number).await?;
    tx.commit().await?;

    tracing::info!(cohort_id = %cohort_id, week = week_number, deleted, "Week resources deleted");

    Ok(response::ok_with(
        DeletedCount { deleted },
        format!("Deleted {} resources", deleted),
    ))
}

/// Delete a single resource
///
/// # Errors
///
/// - `404 Not Found`: Resource does not exist
/// - `409 Conflict`: Learners have completed tasks on the resource
pub async fn delete_resource(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(resource_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<DeletedCount>>> {
    require_instructor(&auth)?;

    let mut tx = state.db.begin().await?;
    ensure_no_completed_tasks(Resource::completed_task_count(&mut *tx, resource_id).await?)?;
    if !Resource::delete(&mut *tx, resource_id).await? {
        return Err(ApiError::NotFound("Resource not found".to_string()));
    }
    tx.commit().await?;

    tracing::info!(resource_id = %resource_id, "Resource deleted");

    Ok(response::ok_with(DeletedCount { deleted: 1 }, "Resource deleted"))
}
