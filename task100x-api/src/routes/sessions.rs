/// Live sessions and their reminder notifications
///
/// Creating a session enqueues one PENDING reminder per learner of the
/// cohort. The worker drafts each message; the instructor reviews the
/// drafts, optionally edits them, and sends them, which queues them for
/// WhatsApp delivery.
///
/// # Endpoints
///
/// - `POST /api/sessions` - Create a session (instructor)
/// - `GET /api/sessions/cohort/:cohort_id` - Sessions of a cohort
/// - `PUT /api/sessions/:id` - Update a session (instructor)
/// - `DELETE /api/sessions/:id` - Delete a session (instructor)
/// - `GET /api/sessions/:id/notifications` - Reminders with learner details (instructor)
/// - `POST /api/sessions/:id/notifications/send` - Queue all drafts (instructor)
/// - `PATCH /api/notifications/:id` - Edit a reminder message (instructor)

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
        notification::{Notification, NotificationView},
        session::{LiveSession, NewSession, UpdateSession},
    },
};
use std::borrow::Cow;

use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    #[serde(flatten)]
    pub session: LiveSession,

    /// Reminders enqueued for the cohort's learners
    pub notifications_created: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditNotificationRequest {
    #[validate(
        length(min = 1, max = 1024, message = "Message must be 1-1024 characters"),
        custom(function = "not_blank")
    )]
    pub message: String,
}

/// The stored message is trimmed, so whitespace alone would save an empty reminder
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::Borrowed("Message must not be blank"));
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct QueuedCount {
    pub queued: u64,
}

async fn ensure_session(state: &AppState, session_id: Uuid) -> ApiResult<LiveSession> {
    LiveSession::find_by_id(&state.db, session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
}

/// Create a live session
///
/// # Endpoint
///
/// ```text
/// POST /api/sessions
/// Authorization: Bearer <instructor token>
///
/// {
///   "cohort_id": "uuid",
///   "title": "LLD of payment apps",
///   "description": "Architecture of UPI apps",
///   "week_number": 3,
///   "scheduled_at": "2025-01-20T14:30:00Z"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the session and `notifications_created`.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an instructor
/// - `404 Not Found`: Cohort does not exist
pub async fn create_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<NewSession>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SessionCreated>>)> {
    require_instructor(&auth)?;
    req.validate()?;

    if !Cohort::exists(&state.db, req.cohort_id).await? {
        return Err(ApiError::NotFound("Cohort not found".to_string()));
    }

    let mut tx = state.db.begin().await?;
    let (session, notifications_created) =
        LiveSession::create_with_notifications(&mut tx, &req).await?;
    tx.commit().await?;

    tracing::info!(
        session_id = %session.id,
        cohort_id = %session.cohort_id,
        notifications = notifications_created,
        "Live session created"
    );

    Ok(response::created(
        SessionCreated {
            session,
            notifications_created,
        },
        "Session created successfully",
    ))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(cohort_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<LiveSession>>>> {
    let sessions = LiveSession::list_by_cohort(&state.db, cohort_id).await?;
    Ok(response::ok(sessions))
}

/// Update a session; omitted fields keep their value
pub async fn update_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<UpdateSession>,
) -> ApiResult<Json<ApiResponse<LiveSession>>> {
    require_instructor(&auth)?;
    req.validate()?;

    let session = LiveSession::update(&state.db, session_id, &req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    Ok(response::ok_with(session, "Session updated successfully"))
}

/// Delete a session and its notifications
pub async fn delete_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Uuid>>> {
    require_instructor(&auth)?;

    if !LiveSession::delete(&state.db, session_id).await? {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }

    tracing::info!(session_id = %session_id, "Live session deleted");

    Ok(response::ok_with(session_id, "Session deleted successfully"))
}

/// Reminders of a session
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": [
///     {
///       "id": "uuid",
///       "status": "DRAFT",
///       "message": "• Ever wondered how UPI settles in seconds?\n• ...",
///       "attempts": 0,
///       "learner_name": "Asha",
///       "learner_email": "asha@example.com",
///       "launchpad": { "is_student": true, "study_stream": "Commerce", ... }
///     }
///   ]
/// }
/// ```
pub async fn session_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<NotificationView>>>> {
    require_instructor(&auth)?;
    ensure_session(&state, session_id).await?;

    let views = Notification::list_by_session(&state.db, session_id)
        .await?
        .into_iter()
        .map(|ctx| ctx.into_view())
        .collect();

    Ok(response::ok(views))
}

/// Queue every DRAFT reminder of a session for delivery
pub async fn send_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<QueuedCount>>> {
    require_instructor(&auth)?;
    ensure_session(&state, session_id).await?;

    let queued = Notification::queue_drafts(&state.db, session_id).await?;

    tracing::info!(session_id = %session_id, queued, "Session reminders queued");

    Ok(response::ok_with(
        QueuedCount { queued },
        format!("{} notifications queued", queued),
    ))
}

/// Edit a reminder message
///
/// Only DRAFT and FAILED reminders can be edited. Editing a FAILED reminder
/// queues it again with a fresh attempt budget.
///
/// # Errors
///
/// - `404 Not Found`: Notification does not exist
/// - `409 Conflict`: Notification is not DRAFT or FAILED
pub async fn edit_notification(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(notification_id): Path<Uuid>,
    Json(req): Json<EditNotificationRequest>,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    require_instructor(&auth)?;
    req.validate()?;

    let existing = Notification::find_by_id(&state.db, notification_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    let not_editable = || {
        ApiError::Conflict(format!(
            "Notification is {} and can no longer be edited",
            existing.status.as_str()
        ))
    };
    if !existing.status.is_editable() {
        return Err(not_editable());
    }

    // The status may have moved on since the read above
    let updated = Notification::edit_message(&state.db, notification_id, req.message.trim())
        .await?
        .ok_or_else(not_editable)?;

    tracing::info!(
        notification_id = %notification_id,
        status = updated.status.as_str(),
        "Notification message edited"
    );

    Ok(response::ok_with(updated, "Notification updated"))
}
