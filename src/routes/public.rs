use crate::{AppState, handlers};
use axum::{Router, routing::get, routing::post};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client. Only two things live here beyond the health probe: the ways into
/// the system, registration and login. Everything else sits behind the
/// bearer gate.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/register
        // Creates an account and returns the public user plus a session token.
        // Duplicate emails fail with 400 EMAIL_EXISTS.
        .route("/auth/register", post(handlers::auth::register))
        // POST /auth/login
        // Exchanges credentials for a session token. Unknown email and wrong
        // password are deliberately indistinguishable in the response.
        .route("/auth/login", post(handlers::auth::login))
}
