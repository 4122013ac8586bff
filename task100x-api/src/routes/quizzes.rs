/// Quiz management, generation and attempts
///
/// # Endpoints
///
/// Instructor:
/// - `POST /api/quizzes` - Create a quiz
/// - `POST /api/quizzes/generate` - Draft a quiz from a session transcription
/// - `PUT /api/quizzes/:id` - Replace a quiz and its questions
/// - `DELETE /api/quizzes/:id` - Delete a quiz
///
/// Any role:
/// - `GET /api/quizzes/cohort/:cohort_id` - Quizzes of a cohort
/// - `GET /api/quizzes/:id` - A quiz; learners never see the answer key
///
/// Learner:
/// - `POST /api/quiz-attempts` - Submit answers
/// - `GET /api/quiz-attempts/:quiz_id/status` - Status of the latest attempt
/// - `GET /api/quiz-attempts/:attempt_id/feedback` - Feedback of an attempt

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
use sqlx::PgPool;
use task100x_shared::{
    auth::{
        authorization::{require_instructor, require_learner, require_self_or_instructor},
        middleware::AuthContext,
    },
    models::{
        cohort::Cohort,
        quiz::{LearnerQuiz, NewQuiz, Quiz, QuizDetail},
        quiz_attempt::{AttemptStatus, FeedbackReport, QuizAnswer, QuizAttempt},
    },
    scoring::{feedback_text, grade, SubmittedAnswer},
};
use uuid::Uuid;
use validator::Validate;

/// Generate quiz request
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    pub cohort_id: Uuid,

    #[validate(range(min = 1, message = "Week number must be positive"))]
    pub week_number: i32,

    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Transcription cannot be empty"))]
    pub transcription: String,
}

/// Submit attempt request
#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    pub quiz_id: Uuid,
    pub answers: Vec<SubmittedAnswer>,
}

/// A quiz as shown to the caller
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QuizView {
    /// With correct answers, for instructors
    Full(QuizDetail),

    /// Without correct answers, for learners
    Learner(LearnerQuiz),
}

#[derive(Debug, Serialize)]
pub struct AttemptResult {
    #[serde(flatten)]
    pub attempt: QuizAttempt,
    pub correct_count: usize,
    pub scorable_count: usize,
    pub answers: Vec<QuizAnswer>,
    pub feedback: String,
}

#[derive(Debug, Serialize)]
pub struct AttemptFeedback {
    pub attempt_id: Uuid,
    pub quiz_id: Uuid,
    pub score: Option<f64>,
    pub feedback_text: String,
}

async fn validate_new_quiz(state: &AppState, quiz: &NewQuiz) -> ApiResult<()> {
    quiz.validate()?;
    quiz.check()?;

    if !Cohort::exists(&state.db, quiz.cohort_id).await? {
        return Err(ApiError::NotFound("Cohort not found".to_string()));
    }
    Ok(())
}

async fn insert_quiz(pool: &PgPool, quiz: &NewQuiz) -> Result<QuizDetail, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let detail = Quiz::create(&mut tx, quiz).await?;
    tx.commit().await?;
    Ok(detail)
}

/// Create a quiz
///
/// # Endpoint
///
/// ```text
/// POST /api/quizzes
/// Authorization: Bearer <instructor token>
///
/// {
///   "cohort_id": "uuid",
///   "week_number": 1,
///   "title": "Week 1 check-in",
///   "questions": [
///     {
///       "question_text": "Which keyword moves ownership into a closure?",
///       "question_type": "MULTIPLE_CHOICE",
///       "options": [
///         { "option_text": "move", "is_correct": true },
///         { "option_text": "ref", "is_correct": false }
///       ]
///     }
///   ]
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: A multiple-choice question has fewer than two
///   options or not exactly one correct option
/// - `403 Forbidden`: Caller is not an instructor
/// - `404 Not Found`: Cohort does not exist
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<NewQuiz>,
) -> ApiResult<(StatusCode, Json<ApiResponse<QuizDetail>>)> {
    require_instructor(&auth)?;
    validate_new_quiz(&state, &req).await?;

    let quiz = insert_quiz(&state.db, &req).await?;

    tracing::info!(
        quiz_id = %quiz.quiz.id,
        cohort_id = %quiz.quiz.cohort_id,
        questions = quiz.questions.len(),
        "Quiz created"
    );

    Ok(response::created(quiz, "Quiz created successfully"))
}

/// Generate a quiz from a transcription
///
/// The configured LLM drafts multiple-choice questions; the result is
/// checked like a hand-written quiz and saved.
///
/// # Errors
///
/// - `502 Bad Gateway`: The model's output was not a usable quiz
/// - `503 Service Unavailable`: No LLM provider is configured, or it is unreachable
pub async fn generate_quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<GenerateQuizRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<QuizDetail>>)> {
    require_instructor(&auth)?;
    req.validate()?;
    let llm = state.llm()?;

    if !Cohort::exists(&state.db, req.cohort_id).await? {
        return Err(ApiError::NotFound("Cohort not found".to_string()));
    }

    let questions = llm.generate_quiz(&req.transcription).await?;
    let new_quiz = NewQuiz {
        cohort_id: req.cohort_id,
        week_number: req.week_number,
        title: req.title,
        questions,
    };
    new_quiz
        .check()
        .map_err(|e| ApiError::BadGateway(format!("Generated quiz is invalid: {}", e)))?;

    let quiz = insert_quiz(&state.db, &new_quiz).await?;

    tracing::info!(
        quiz_id = %quiz.quiz.id,
        model = llm.model(),
        questions = quiz.questions.len(),
        "Quiz generated from transcription"
    );

    Ok(response::created(quiz, "Quiz generated successfully"))
}

pub async fn list_quizzes(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(cohort_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<Quiz>>>> {
    let quizzes = Quiz::list_by_cohort(&state.db, cohort_id).await?;
    Ok(response::ok(quizzes))
}

/// Get a quiz
///
/// Instructors receive the answer key; learners receive questions and
/// options only.
pub async fn get_quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(quiz_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<QuizView>>> {
    let quiz = Quiz::find_detail(&state.db, quiz_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let view = if auth.is_instructor() {
        QuizView::Full(quiz)
    } else {
        QuizView::Learner(quiz.for_learner())
    };

    Ok(response::ok(view))
}

/// Replace a quiz
///
/// Existing questions are deleted and the given ones inserted in one
/// transaction. Earlier attempts keep their stored score.
pub async fn update_quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<NewQuiz>,
) -> ApiResult<Json<ApiResponse<QuizDetail>>> {
    require_instructor(&auth)?;
    validate_new_quiz(&state, &req).await?;

    let mut tx = state.db.begin().await?;
    let quiz = Quiz::replace(&mut tx, quiz_id, &req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;
    tx.commit().await?;

    tracing::info!(quiz_id = %quiz_id, "Quiz updated");

    Ok(response::ok_with(quiz, "Quiz updated successfully"))
}

pub async fn delete_quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(quiz_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Uuid>>> {
    require_instructor(&auth)?;

    if !Quiz::delete(&state.db, quiz_id).await? {
        return Err(ApiError::NotFound("Quiz not found".to_string()));
    }

    tracing::info!(quiz_id = %quiz_id, "Quiz deleted");

    Ok(response::ok_with(quiz_id, "Quiz deleted successfully"))
}

/// Submit a quiz attempt
///
/// # Endpoint
///
/// ```text
/// POST /api/quiz-attempts
/// Authorization: Bearer <learner token>
///
/// {
///   "quiz_id": "uuid",
///   "answers": [
///     { "question_id": "uuid", "option_id": "uuid" },
///     { "question_id": "uuid", "answer_text": "Borrowing lets..." }
///   ]
/// }
/// ```
///
/// # Response
///
/// The stored attempt with its score (percentage of multiple-choice
/// questions answered correctly; `null` when the quiz has none), the graded
/// answers and the feedback text.
///
/// # Errors
///
/// - `400 Bad Request`: An answer references a question or option of another quiz,
///   or a question is answered twice
/// - `404 Not Found`: Quiz does not exist
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SubmitAttemptRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AttemptResult>>)> {
    require_learner(&auth)?;

    let quiz = Quiz::find_detail(&state.db, req.quiz_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let graded = grade(&quiz, &req.answers)?;
    let feedback = feedback_text(&graded);

    let mut tx = state.db.begin().await?;
    let (attempt, answers) =
        QuizAttempt::create(&mut tx, quiz.quiz.id, auth.user_id, &graded, &feedback).await?;
    tx.commit().await?;

    tracing::info!(
        attempt_id = %attempt.id,
        quiz_id = %attempt.quiz_id,
        learner_id = %auth.user_id,
        score = ?attempt.score,
        "Quiz attempt submitted"
    );

    Ok(response::created(
        AttemptResult {
            attempt,
            correct_count: graded.correct_count,
            scorable_count: graded.scorable_count,
            answers,
            feedback,
        },
        "Quiz submitted successfully",
    ))
}

/// Status of the caller's latest attempt on a quiz
///
/// # Response
///
/// ```json
/// { "success": true, "data": { "status": "COMPLETED", "attempt_id": "uuid", "score": 80.0 } }
/// ```
pub async fn attempt_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(quiz_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<AttemptStatus>>> {
    require_learner(&auth)?;

    let latest = QuizAttempt::latest_for(&state.db, auth.user_id, quiz_id).await?;

    Ok(response::ok(AttemptStatus::from_latest(latest.as_ref())))
}

/// Feedback of an attempt
///
/// Available to the learner who made the attempt and to instructors.
pub async fn attempt_feedback(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(attempt_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<AttemptFeedback>>> {
    let attempt = QuizAttempt::find_by_id(&state.db, attempt_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Quiz attempt not found".to_string()))?;
    require_self_or_instructor(&auth, attempt.learner_id)?;

    let report = FeedbackReport::find_by_attempt(&state.db, attempt_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Feedback not found".to_string()))?;

    Ok(response::ok(AttemptFeedback {
        attempt_id: attempt.id,
        quiz_id: attempt.quiz_id,
        score: attempt.score,
        feedback_text: report.feedback_text,
    }))
}
