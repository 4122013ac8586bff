/// Authentication and authorization utilities
///
/// This module provides the authentication primitives for Task 100x:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and validation
/// - [`jwt`]: JWT token generation and validation
/// - [`middleware`]: Axum middleware that turns a bearer token into an [`middleware::AuthContext`]
/// - [`authorization`]: Role checks for instructor and learner routes
///
/// # Example
///
/// ```no_run
/// use task100x_shared::auth::password::{hash_password, verify_password};
/// use task100x_shared::auth::jwt::{create_token, validate_token, Claims, TokenType};
/// use task100x_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("learning2025")?;
/// assert!(verify_password("learning2025", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "a@b.co".into(), UserRole::Learner, TokenType::Access);
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!!")?;
/// let validated = validate_token(&token, "secret-key-at-least-32-bytes-long!!")?;
/// assert_eq!(validated.role, UserRole::Learner);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
