/// Learner ingestion and lookup
///
/// # Endpoints
///
/// - `POST /api/learners/import` - Bulk import learners from spreadsheet rows
/// - `GET /api/users/:id` - A user with their launchpad profile

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{self, ApiResponse},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use task100x_shared::{
    auth::{authorization::require_instructor, middleware::AuthContext},
    import::{self, ImportRequest, ImportSummary},
    models::{
        launchpad::{Launchpad, LaunchpadProfile},
        user::User,
    },
};
use uuid::Uuid;

/// A user together with their onboarding answers
#[derive(Debug, Serialize)]
pub struct LearnerView {
    #[serde(flatten)]
    pub user: User,
    pub launchpad: Option<LaunchpadProfile>,
}

impl LearnerView {
    pub fn new(user: User, launchpad: Option<&Launchpad>) -> Self {
        Self {
            user,
            launchpad: launchpad.map(Launchpad::profile),
        }
    }
}

/// Bulk import learners
///
/// Rows carry the spreadsheet's own headers (`Email`, `Name`, `Phone Number`,
/// `Student`, ...). Every row is imported independently; one bad row never
/// aborts the others.
///
/// # Endpoint
///
/// ```text
/// POST /api/learners/import
/// Authorization: Bearer <instructor token>
///
/// {
///   "cohort_id": "uuid",
///   "on_duplicate": "skip",
///   "rows": [
///     { "Email": "asha@example.com", "Name": "Asha", "Phone Number": "+919800000000", "Student": "Yes" }
///   ]
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "total": 1,
///     "success_count": 1,
///     "skipped_count": 0,
///     "failure_count": 0,
///     "results": [ { "status": "success", "email": "asha@example.com", "user_id": "uuid" } ]
///   }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: No rows, or more rows than one import accepts
/// - `403 Forbidden`: Caller is not an instructor
/// - `404 Not Found`: Cohort does not exist
pub async fn import_learners(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ImportRequest>,
) -> ApiResult<Json<ApiResponse<ImportSummary>>> {
    require_instructor(&auth)?;

    let summary = import::import_learners(&state.db, req).await?;

    tracing::info!(
        instructor_id = %auth.user_id,
        total = summary.total,
        success = summary.success_count,
        skipped = summary.skipped_count,
        failed = summary.failure_count,
        "Learner import finished"
    );

    Ok(response::ok_with(summary, "Import finished"))
}

/// Get a user with their launchpad profile (instructor only)
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<LearnerView>>> {
    require_instructor(&auth)?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let launchpad = Launchpad::find_by_user(&state.db, user_id).await?;

    Ok(response::ok(LearnerView::new(user, launchpad.as_ref())))
}
