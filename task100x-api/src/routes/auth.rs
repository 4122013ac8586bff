/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Signup
/// - Login
/// - Token refresh
/// - Current user
///
/// # Endpoints
///
/// - `POST /auth/signup` - Register a learner or instructor
/// - `POST /auth/login` - Login and get tokens
/// - `POST /auth/refresh` - Refresh access token
/// - `GET /auth/me` - Profile of the authenticated user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    response::{self, ApiResponse},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use task100x_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::{
        cohort::Cohort,
        user::{normalize_email, CreateUser, User, UserRole, CREATED_FROM_SIGNUP},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (will be validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub role: UserRole,

    /// Cohort to join
    pub cohort_id: Option<Uuid>,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 20, message = "Phone number must be at most 20 characters"))]
    pub phone_number: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Public view of a user
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub cohort_id: Option<Uuid>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            cohort_id: user.cohort_id,
            phone_number: user.phone_number.clone(),
            created_at: user.created_at,
        }
    }
}

/// Token pair returned by signup and login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Access token
    pub token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    /// Always `bearer`
    pub token_type: &'static str,

    pub user: UserProfile,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
    pub token_type: &'static str,
}

fn issue_tokens(state: &AppState, user: &User) -> ApiResult<TokenResponse> {
    let access_claims = jwt::Claims::with_expiration(
        user.id,
        user.email.clone(),
        user.role,
        jwt::TokenType::Access,
        state.config.access_token_ttl(),
    );
    let refresh_claims =
        jwt::Claims::new(user.id, user.email.clone(), user.role, jwt::TokenType::Refresh);

    Ok(TokenResponse {
        token: jwt::create_token(&access_claims, state.jwt_secret())?,
        refresh_token: jwt::create_token(&refresh_claims, state.jwt_secret())?,
        token_type: "bearer",
        user: UserProfile::from(user),
    })
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/signup
/// Content-Type: application/json
///
/// {
///   "email": "learner@example.com",
///   "password": "SecureP@ss123",
///   "role": "LEARNER",
///   "cohort_id": "uuid",
///   "name": "Asha",
///   "phone_number": "+919800000000"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJ...",
///     "refresh_token": "eyJ...",
///     "token_type": "bearer",
///     "user": { "id": "uuid", "email": "learner@example.com", "role": "LEARNER", ... }
///   },
///   "message": "User created successfully"
/// }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Cohort does not exist
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TokenResponse>>)> {
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let email = normalize_email(&req.email);
    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    if let Some(cohort_id) = req.cohort_id {
        if !Cohort::exists(&state.db, cohort_id).await? {
            return Err(ApiError::NotFound("Cohort not found".to_string()));
        }
    }

    let password_hash = password::hash_password(&req.password)?;

    // The unique index still guards a concurrent signup with the same email
    let user = User::create(
        &state.db,
        CreateUser {
            email,
            password_hash: Some(password_hash),
            name: req.name,
            phone_number: req.phone_number,
            role: req.role,
            cohort_id: req.cohort_id,
            created_from: CREATED_FROM_SIGNUP.to_string(),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User signed up");

    Ok(response::created(
        issue_tokens(&state, &user)?,
        "User created successfully",
    ))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// {
///   "email": "learner@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email, wrong password, or an imported
///   account that has no password yet
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<TokenResponse>>> {
    req.validate()?;

    let rejected = || ApiError::Unauthorized("Incorrect email or password".to_string());

    let user = User::find_by_email(&state.db, &normalize_email(&req.email))
        .await?
        .ok_or_else(rejected)?;

    let hash = user.password_hash.as_deref().ok_or_else(rejected)?;
    if !password::verify_password(&req.password, hash)? {
        return Err(rejected());
    }

    User::update_last_login(&state.db, user.id).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(response::ok_with(
        issue_tokens(&state, &user)?,
        "Login successful",
    ))
}

/// Token refresh endpoint
///
/// Exchanges a refresh token for a new access token.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<RefreshResponse>>> {
    let token = jwt::refresh_access_token(
        &req.refresh_token,
        state.jwt_secret(),
        state.config.access_token_ttl(),
    )?;

    Ok(response::ok(RefreshResponse {
        token,
        token_type: "bearer",
    }))
}

/// Current user profile
///
/// # Errors
///
/// - `404 Not Found`: The account was deleted after the token was issued
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(response::ok(UserProfile::from(&user)))
}
