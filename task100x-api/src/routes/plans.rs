/// Learner plans and task completion
///
/// # Endpoints
///
/// - `POST /api/plans` - Create a plan from chosen resources (learner)
/// - `GET /api/plans/:cohort_id?week_number=N` - The learner's plan for a week
/// - `PATCH /api/tasks/:task_id/complete` - Complete a task and update streaks

use std::collections::HashSet;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{self, ApiResponse},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use task100x_shared::{
    auth::{authorization::require_learner, middleware::AuthContext},
    models::{
        cohort::Cohort,
        plan::{Plan, PlanWithTasks},
        resource::Resource,
        task::Task,
    },
    progress::streak::{self, TaskCompletion},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanTaskInput {
    pub resource_id: Uuid,
}

/// Create plan request
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlanRequest {
    pub cohort_id: Uuid,

    #[validate(length(min = 1, message = "A plan needs at least one task"))]
    pub tasks: Vec<PlanTaskInput>,
}

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    pub week_number: i32,
}

/// Creates a plan and its PENDING tasks in one transaction
async fn create_plan_with_tasks(
    pool: &PgPool,
    user_id: Uuid,
    cohort_id: Uuid,
    resource_ids: &[Uuid],
) -> Result<PlanWithTasks, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let plan = Plan::create(&mut *tx, user_id, cohort_id).await?;
    Task::create_for_plan(&mut tx, plan.id, resource_ids, Utc::now()).await?;
    let tasks = Task::list_details_for_plan(&mut *tx, plan.id).await?;

    tx.commit().await?;

    Ok(PlanWithTasks { plan, tasks })
}

/// Create a plan
///
/// # Endpoint
///
/// ```text
/// POST /api/plans
/// Authorization: Bearer <learner token>
///
/// {
///   "cohort_id": "uuid",
///   "tasks": [ { "resource_id": "uuid" }, { "resource_id": "uuid" } ]
/// }
/// ```
///
/// Every task starts PENDING with `assigned_date` set to now.
///
/// # Errors
///
/// - `400 Bad Request`: A resource is not part of the cohort
/// - `403 Forbidden`: Caller is not a learner
/// - `404 Not Found`: Cohort does not exist
pub async fn create_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreatePlanRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PlanWithTasks>>)> {
    require_learner(&auth)?;
    req.validate()?;

    if !Cohort::exists(&state.db, req.cohort_id).await? {
        return Err(ApiError::NotFound("Cohort not found".to_string()));
    }

    let cohort_resources: HashSet<Uuid> = Resource::list_by_cohort(&state.db, req.cohort_id)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();

    let resource_ids: Vec<Uuid> = req.tasks.iter().map(|t| t.resource_id).collect();
    if let Some(unknown) = resource_ids.iter().find(|id| !cohort_resources.contains(id)) {
        return Err(ApiError::BadRequest(format!(
            "Resource {} does not belong to this cohort",
            unknown
        )));
    }

    let plan = create_plan_with_tasks(&state.db, auth.user_id, req.cohort_id, &resource_ids).await?;

    tracing::info!(
        plan_id = %plan.plan.id,
        user_id = %auth.user_id,
        tasks = plan.tasks.len(),
        "Plan created"
    );

    Ok(response::created(plan, "Plan created successfully"))
}

/// The learner's plan for one week
///
/// When the learner has no plan with tasks for the week yet, a plan holding
/// one task per resource of that week is created on the fly. `data` is
/// `null` when the week has neither a plan nor resources.
///
/// # Endpoint
///
/// ```text
/// GET /api/plans/:cohort_id?week_number=3
/// Authorization: Bearer <learner token>
/// ```
pub async fn get_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(cohort_id): Path<Uuid>,
    Query(query): Query<WeekQuery>,
) -> ApiResult<Json<ApiResponse<Option<PlanWithTasks>>>> {
    require_learner(&auth)?;
    if query.week_number < 1 {
        return Err(ApiError::BadRequest("Week number must be positive".to_string()));
    }

    if let Some(plan) =
        Plan::find_for_week(&state.db, auth.user_id, cohort_id, query.week_number).await?
    {
        let tasks = Task::list_details_for_week(&state.db, plan.id, query.week_number).await?;
        return Ok(response::ok(Some(PlanWithTasks { plan, tasks })));
    }

    let resources = Resource::list_by_week(&state.db, cohort_id, query.week_number).await?;
    if resources.is_empty() {
        return Ok(response::ok_with(None, "No plan or resources for this week"));
    }

    let resource_ids: Vec<Uuid> = resources.iter().map(|r| r.id).collect();
    let plan = create_plan_with_tasks(&state.db, auth.user_id, cohort_id, &resource_ids).await?;

    tracing::info!(
        plan_id = %plan.plan.id,
        user_id = %auth.user_id,
        week = query.week_number,
        "Plan generated from week resources"
    );

    Ok(response::ok_with(Some(plan), "Plan generated"))
}

/// Complete a task
///
/// Marks the task COMPLETED and updates the learner's daily and weekly
/// streaks in the same transaction. Completing a task twice is a no-op.
///
/// # Endpoint
///
/// ```text
/// PATCH /api/tasks/:task_id/complete
/// Authorization: Bearer <learner token>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "task_id": "uuid",
///     "completed_at": "2025-01-08T10:00:00Z",
///     "newly_completed": true,
///     "streak": { "current_streak": 3, "longest_streak": 5, "weekly_streak": 1, ... }
///   }
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not a learner
/// - `404 Not Found`: Task does not exist or belongs to another learner
pub async fn complete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<TaskCompletion>>> {
    require_learner(&auth)?;

    let completion = streak::complete_task(&state.db, auth.user_id, task_id, Utc::now())
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let message = if completion.newly_completed {
        "Task completed"
    } else {
        "Task was already completed"
    };

    Ok(response::ok_with(completion, message))
}
