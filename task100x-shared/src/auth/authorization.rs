/// Authorization helpers and permission checks
///
/// Task 100x has two roles. Instructors manage cohorts, content, quizzes and
/// sessions; learners work through their own plans. Role checks read the role
/// out of the [`AuthContext`], and ownership checks compare the caller with
/// the owner of the row being touched.
///
/// # Example
///
/// ```
/// use task100x_shared::auth::authorization::{require_instructor, require_ownership};
/// use task100x_shared::auth::middleware::AuthContext;
/// use task100x_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let auth = AuthContext {
///     user_id: Uuid::new_v4(),
///     email: "learner@example.com".to_string(),
///     role: UserRole::Learner,
/// };
///
/// assert!(require_instructor(&auth).is_err());
/// assert!(require_ownership(&auth, auth.user_id).is_ok());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::user::UserRole;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User doesn't have required role
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole { required: UserRole, actual: UserRole },

    /// User doesn't own the resource
    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// Checks that the caller has exactly `required` role
pub fn require_role(auth: &AuthContext, required: UserRole) -> Result<(), AuthzError> {
    if auth.role != required {
        return Err(AuthzError::InsufficientRole {
            required,
            actual: auth.role,
        });
    }

    Ok(())
}

/// Checks that the caller is an instructor
pub fn require_instructor(auth: &AuthContext) -> Result<(), AuthzError> {
    require_role(auth, UserRole::Instructor)
}

/// Checks that the caller is a learner
pub fn require_learner(auth: &AuthContext) -> Result<(), AuthzError> {
    require_role(auth, UserRole::Learner)
}

/// Checks that the caller owns a resource
///
/// # Errors
///
/// Returns `AuthzError::NotAuthorized` when `resource_owner_id` is someone else.
pub fn require_ownership(auth: &AuthContext, resource_owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id != resource_owner_id {
        return Err(AuthzError::NotAuthorized);
    }

    Ok(())
}

/// Checks that the caller may read data belonging to `user_id`
///
/// Instructors can read any learner's data; learners only their own.
pub fn require_self_or_instructor(auth: &AuthContext, user_id: Uuid) -> Result<(), AuthzError> {
    if auth.is_instructor() {
        return Ok(());
    }

    require_ownership(auth, user_id)
}
