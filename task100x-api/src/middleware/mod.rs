/// Middleware modules for the API server
///
/// Authentication lives in `app::jwt_auth_layer`; this module holds the
/// response-level layers:
/// - Security headers

pub mod security;
