/// Integration tests for the Task 100x API
///
/// The first group drives the router over a pool that never connects: every
/// request there is rejected (or answered) before a query runs.
///
/// The `#[ignore]`d group needs PostgreSQL (`TEST_DATABASE_URL`) and covers
/// the main instructor and learner flows end to end:
///
/// ```bash
/// cargo test -p task100x-api --test integration_test -- --ignored
/// ```

mod common;

use axum::http::StatusCode;
use common::{access_token, create_user, json_request, lazy_app, send, token_for, TestContext};
use serde_json::json;
use task100x_shared::auth::jwt::TokenType;
use task100x_shared::models::notification::NotificationStatus;
use task100x_shared::models::user::UserRole;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = lazy_app();

    let (status, body) = send(&app, json_request("GET", "/api/cohorts", None, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let app = lazy_app();
    let refresh = token_for(Uuid::new_v4(), UserRole::Learner, TokenType::Refresh);

    let (status, _) = send(&app, json_request("GET", "/auth/me", Some(&refresh), None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_learner_cannot_create_cohort() {
    let app = lazy_app();
    let token = access_token(UserRole::Learner);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/cohorts",
            Some(&token),
            Some(json!({ "name": "Cohort 5", "total_weeks": 12 })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_instructor_cannot_complete_tasks() {
    let app = lazy_app();
    let token = access_token(UserRole::Instructor);
    let uri = format!("/api/tasks/{}/complete", Uuid::new_v4());

    let (status, _) = send(&app, json_request("PATCH", &uri, Some(&token), None)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_cohort_is_rejected_before_database() {
    let app = lazy_app();
    let token = access_token(UserRole::Instructor);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/cohorts",
            Some(&token),
            Some(json!({ "name": "Too long", "total_weeks": 53 })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "total_weeks");
}

#[tokio::test]
async fn test_blank_notification_edit_is_rejected_before_database() {
    let app = lazy_app();
    let token = access_token(UserRole::Instructor);

    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/api/notifications/{}", Uuid::new_v4()),
            Some(&token),
            Some(json!({ "message": "   \n " })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "message");
    assert_eq!(body["details"][0]["message"], "Message must not be blank");
}

#[tokio::test]
async fn test_quiz_generation_unavailable_without_llm() {
    let app = lazy_app();
    let token = access_token(UserRole::Instructor);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/quizzes/generate",
            Some(&token),
            Some(json!({
                "cohort_id": Uuid::new_v4(),
                "week_number": 1,
                "title": "Week 1",
                "transcription": "Today we covered ownership and borrowing."
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "service_unavailable");
}

#[tokio::test]
async fn test_heatmap_rejects_reversed_range() {
    let app = lazy_app();
    let token = access_token(UserRole::Learner);
    let uri = format!(
        "/api/build-in-public/users/{}/heatmap?start_date=2025-03-01&end_date=2025-02-01",
        Uuid::new_v4()
    );

    let (status, body) = send(&app, json_request("GET", &uri, Some(&token), None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("after"));
}

#[tokio::test]
async fn test_security_headers_on_rejections() {
    let app = lazy_app();

    let response = app
        .oneshot(json_request("GET", "/api/leaderboard", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().get("strict-transport-security").is_none());
}

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let app = lazy_app();

    let (status, body) = send(&app, json_request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_signup_login_and_me() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("signup-{}@Example.com", Uuid::new_v4());

    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/auth/signup",
            None,
            Some(json!({
                "email": email,
                "password": "password123",
                "role": "LEARNER",
                "cohort_id": ctx.cohort.id,
                "name": "Asha"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["token_type"], "bearer");
    assert_eq!(body["data"]["user"]["email"], email.to_lowercase());

    let (status, _) = send(
        &ctx.app,
        json_request(
            "POST",
            "/auth/signup",
            None,
            Some(json!({ "email": email, "password": "password123", "role": "LEARNER" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": "wrong-password1" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Incorrect email or password");

    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": "password123" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let (status, body) = send(&ctx.app, json_request("GET", "/auth/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Asha");

    let (status, body) = send(
        &ctx.app,
        json_request("POST", "/auth/refresh", None, Some(json!({ "refresh_token": refresh }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());

    sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email.to_lowercase())
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_weekly_progress_without_cohort_is_empty() {
    let ctx = TestContext::new().await.unwrap();
    let loner = create_user(&ctx.db, UserRole::Learner, None).await.unwrap();
    let token = token_for(loner.id, UserRole::Learner, TokenType::Access);

    let (status, body) = send(
        &ctx.app,
        json_request("GET", "/api/progress/weekly", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["weeks"], json!([]));
    assert_eq!(body["data"]["completion_rate"], 0.0);

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(loner.id)
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_plan_completion_updates_streak() {
    let ctx = TestContext::new().await.unwrap();
    let resources_uri = format!("/api/resources/{}/1", ctx.cohort.id);

    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            &resources_uri,
            Some(&ctx.instructor_token),
            Some(json!([
                { "title": "Intro", "url": "https://example.com/intro", "type": "ARTICLE", "duration": 10 },
                { "title": "Extra", "url": "https://example.com/extra", "type": "VIDEO", "is_optional": true }
            ])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // No plan yet: one is generated from the week's resources
    let plan_uri = format!("/api/plans/{}?week_number=1", ctx.cohort.id);
    let (status, body) = send(&ctx.app, json_request("GET", &plan_uri, Some(&ctx.learner_token), None)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let tasks = body["data"]["tasks"].as_array().unwrap().clone();
    assert_eq!(tasks.len(), 2);

    let required = tasks.iter().find(|t| t["is_optional"] == false).unwrap();
    let complete_uri = format!("/api/tasks/{}/complete", required["id"].as_str().unwrap());

    let (status, body) = send(&ctx.app, json_request("PATCH", &complete_uri, Some(&ctx.learner_token), None)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["newly_completed"], true);
    assert_eq!(body["data"]["streak"]["current_streak"], 1);
    assert_eq!(body["data"]["streak"]["weekly_streak"], 1);

    let (_, body) = send(&ctx.app, json_request("PATCH", &complete_uri, Some(&ctx.learner_token), None)).await;
    assert_eq!(body["data"]["newly_completed"], false);
    assert_eq!(body["data"]["streak"]["current_streak"], 1);

    // Another learner cannot see the task
    let stranger = token_for(Uuid::new_v4(), UserRole::Learner, TokenType::Access);
    let (status, _) = send(&ctx.app, json_request("PATCH", &complete_uri, Some(&stranger), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&ctx.app, json_request("GET", "/api/progress/weekly", Some(&ctx.learner_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["completion_rate"], 100.0);

    let dashboard_uri = format!("/api/dashboard/{}", ctx.cohort.id);
    let (status, body) = send(&ctx.app, json_request("GET", &dashboard_uri, Some(&ctx.instructor_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_learners"], 1);
    assert_eq!(body["data"]["completed_tasks"], 1);

    // Completed work keeps its resources in place
    let (status, _) = send(&ctx.app, json_request("DELETE", &resources_uri, Some(&ctx.instructor_token), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &ctx.app,
        json_request("POST", &resources_uri, Some(&ctx.instructor_token), Some(json!([]))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let required_resource = format!("/api/resources/{}", required["resource_id"].as_str().unwrap());
    let (status, _) = send(&ctx.app, json_request("DELETE", &required_resource, Some(&ctx.instructor_token), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let optional = tasks.iter().find(|t| t["is_optional"] == true).unwrap();
    let optional_resource = format!("/api/resources/{}", optional["resource_id"].as_str().unwrap());
    let (status, _) = send(&ctx.app, json_request("DELETE", &optional_resource, Some(&ctx.instructor_token), None)).await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_quiz_attempt_is_scored() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/api/quizzes",
            Some(&ctx.instructor_token),
            Some(json!({
                "cohort_id": ctx.cohort.id,
                "week_number": 1,
                "title": "Week 1",
                "questions": [
                    {
                        "question_text": "Which keyword moves ownership into a closure?",
                        "question_type": "MULTIPLE_CHOICE",
                        "options": [
                            { "option_text": "move", "is_correct": true },
                            { "option_text": "ref", "is_correct": false }
                        ]
                    },
                    {
                        "question_text": "Explain borrowing in one sentence.",
                        "question_type": "TEXT"
                    }
                ]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let quiz_id = body["data"]["id"].as_str().unwrap().to_string();

    // Learners never see which option is correct
    let (_, body) = send(&ctx.app, json_request("GET", &format!("/api/quizzes/{}", quiz_id), Some(&ctx.learner_token), None)).await;
    let mcq = &body["data"]["questions"][0];
    assert!(mcq["options"][0].get("is_correct").is_none());

    let status_uri = format!("/api/quiz-attempts/{}/status", quiz_id);
    let (_, body) = send(&ctx.app, json_request("GET", &status_uri, Some(&ctx.learner_token), None)).await;
    assert_eq!(body["data"]["status"], "NOT_ATTEMPTED");

    let correct = mcq["options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["option_text"] == "move")
        .unwrap()["id"]
        .clone();
    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/api/quiz-attempts",
            Some(&ctx.learner_token),
            Some(json!({
                "quiz_id": quiz_id,
                "answers": [
                    { "question_id": mcq["id"], "option_id": correct },
                    { "question_id": body_question_id(&ctx, &quiz_id).await, "answer_text": "Using a value without owning it." }
                ]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["score"], 100.0);
    let attempt_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&ctx.app, json_request("GET", &status_uri, Some(&ctx.learner_token), None)).await;
    assert_eq!(body["data"]["status"], "COMPLETED");
    assert_eq!(body["data"]["score"], 100.0);

    let feedback_uri = format!("/api/quiz-attempts/{}/feedback", attempt_id);
    let (status, body) = send(&ctx.app, json_request("GET", &feedback_uri, Some(&ctx.learner_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["feedback_text"].as_str().unwrap().contains("1 of 1"));

    ctx.cleanup().await.unwrap();
}

async fn body_question_id(ctx: &TestContext, quiz_id: &str) -> serde_json::Value {
    let (_, body) = send(
        &ctx.app,
        json_request("GET", &format!("/api/quizzes/{}", quiz_id), Some(&ctx.learner_token), None),
    )
    .await;
    body["data"]["questions"][1]["id"].clone()
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_session_creates_pending_notifications() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/api/sessions",
            Some(&ctx.instructor_token),
            Some(json!({
                "cohort_id": ctx.cohort.id,
                "title": "LLD of payment apps",
                "description": "Architecture of UPI apps",
                "week_number": 3
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["notifications_created"], 1);
    let session_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &ctx.app,
        json_request("GET", &format!("/api/sessions/{}/notifications", session_id), Some(&ctx.instructor_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let notification = &body["data"][0];
    assert_eq!(notification["status"], NotificationStatus::Pending.as_str());
    assert_eq!(notification["learner_email"], ctx.learner.email);

    // PENDING reminders have no draft to edit yet
    let (status, _) = send(
        &ctx.app,
        json_request(
            "PATCH",
            &format!("/api/notifications/{}", notification["id"].as_str().unwrap()),
            Some(&ctx.instructor_token),
            Some(json!({ "message": "See you there" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    ctx.cleanup().await.unwrap();
}
