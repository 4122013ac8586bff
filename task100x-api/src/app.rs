/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use task100x_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = task100x_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use task100x_shared::auth::middleware::authenticate;
use task100x_shared::llm::{LlmClient, LlmError};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Quiz generation client; None when no provider is configured
    pub llm: Option<LlmClient>,
}

impl AppState {
    /// Creates new application state
    ///
    /// # Errors
    ///
    /// Fails when the LLM HTTP client cannot be built.
    pub fn new(db: PgPool, config: Config) -> Result<Self, LlmError> {
        let llm = config.llm.clone().map(LlmClient::new).transpose()?;

        Ok(Self {
            db,
            config: Arc::new(config),
            llm,
        })
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// The LLM client, or 503 when quiz generation is disabled
    pub fn llm(&self) -> Result<&LlmClient, ApiError> {
        self.llm.as_ref().ok_or_else(|| {
            ApiError::ServiceUnavailable("Quiz generation is not configured".to_string())
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                         # Health check (public)
/// ├── /auth/                          # signup, login, refresh (public), me
/// └── /api/                           # Everything else (JWT required)
///     ├── /cohorts, /dashboard        # Instructor cohort management
///     ├── /resources                  # Weekly content
///     ├── /plans, /tasks              # Learner plans and task completion
///     ├── /streaks, /progress, /leaderboard
///     ├── /quizzes, /quiz-attempts
///     ├── /sessions, /notifications   # Live sessions and reminders
///     ├── /learners/import, /users    # Bulk learner ingestion
///     └── /build-in-public            # Post engagement
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (on `/api` and `/auth/me`)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .merge(
            Router::new()
                .route("/me", get(routes::auth::me))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    jwt_auth_layer,
                )),
        );

    let api_routes = Router::new()
        // Cohorts
        .route(
            "/cohorts",
            get(routes::cohorts::list_cohorts).post(routes::cohorts::create_cohort),
        )
        .route("/cohorts/current", get(routes::cohorts::current_cohort))
        .route("/cohorts/:id/users", get(routes::cohorts::cohort_users))
        .route("/dashboard/:cohort_id", get(routes::cohorts::dashboard))
        // Resources
        .route("/resources", post(routes::resources::create_resource))
        .route(
            "/resources/all_by_cohort/:cohort_id",
            get(routes::resources::all_by_cohort),
        )
        .route("/resources/:id", delete(routes::resources::delete_resource))
        .route(
            "/resources/:id/:week",
            get(routes::resources::week_resources)
                .post(routes::resources::replace_week)
                .delete(routes::resources::delete_week),
        )
        // Plans and tasks
        .route("/plans", post(routes::plans::create_plan))
        .route("/plans/:cohort_id", get(routes::plans::get_plan))
        .route("/tasks/:task_id/complete", patch(routes::plans::complete_task))
        // Streaks and progress
        .route("/streaks/me", get(routes::progress::my_streak))
        .route("/progress/weekly", get(routes::progress::weekly_progress))
        .route("/leaderboard", get(routes::progress::leaderboard))
        // Quizzes
        .route("/quizzes", post(routes::quizzes::create_quiz))
        .route("/quizzes/generate", post(routes::quizzes::generate_quiz))
        .route("/quizzes/cohort/:cohort_id", get(routes::quizzes::list_quizzes))
        .route(
            "/quizzes/:id",
            get(routes::quizzes::get_quiz)
                .put(routes::quizzes::update_quiz)
                .delete(routes::quizzes::delete_quiz),
        )
        .route("/quiz-attempts", post(routes::quizzes::submit_attempt))
        .route("/quiz-attempts/:id/status", get(routes::quizzes::attempt_status))
        .route("/quiz-attempts/:id/feedback", get(routes::quizzes::attempt_feedback))
        // Live sessions and notifications
        .route("/sessions", post(routes::sessions::create_session))
        .route("/sessions/cohort/:cohort_id", get(routes::sessions::list_sessions))
        .route(
            "/sessions/:id",
            put(routes::sessions::update_session).delete(routes::sessions::delete_session),
        )
        .route(
            "/sessions/:id/notifications",
            get(routes::sessions::session_notifications),
        )
        .route(
            "/sessions/:id/notifications/send",
            post(routes::sessions::send_notifications),
        )
        .route("/notifications/:id", patch(routes::sessions::edit_notification))
        // Learner import
        .route("/learners/import", post(routes::learners::import_learners))
        .route("/users/:id", get(routes::learners::get_user))
        // Build in public
        .route("/build-in-public/posts", post(routes::build_in_public::upsert_post))
        .route("/build-in-public/users", get(routes::build_in_public::list_users))
        .route(
            "/build-in-public/users/:id/name",
            get(routes::build_in_public::user_name),
        )
        .route(
            "/build-in-public/users/:id/analytics",
            get(routes::build_in_public::user_analytics),
        )
        .route(
            "/build-in-public/users/:id/heatmap",
            get(routes::build_in_public::user_heatmap),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer access token, then injects `AuthContext` into
/// request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
