use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any caller who has passed the bearer
/// gate: the post feed and its mutations, profile reads and edits, and the
/// token verification endpoint.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware
/// being present on the router layer above this module. Handlers that mutate
/// then enforce their own Owner-Only checks (e.g. `update_post`,
/// `delete_post`) against the extracted identity.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /auth/verify
        // Confirms the presented token maps to a live account. The gate does
        // all the work; the handler only shapes the response.
        .route("/auth/verify", post(handlers::auth::verify))
        // --- Posts ---
        // GET /posts (feed) and POST /posts (create).
        .route(
            "/posts",
            get(handlers::posts::list_posts).post(handlers::posts::create_post),
        )
        // GET /posts/search?q=...
        // Case-insensitive content search. Registered before the {id} route
        // so the literal segment wins the match.
        .route("/posts/search", get(handlers::posts::search_posts))
        // GET/PUT/DELETE /posts/{id}
        // Single-post read and the owner-only mutations. The ownership check
        // happens in the handler, after existence, before any write.
        .route(
            "/posts/{id}",
            get(handlers::posts::get_post)
                .put(handlers::posts::update_post)
                .delete(handlers::posts::delete_post),
        )
        // --- Users ---
        // GET /users?search=...
        // Paginated discovery listing.
        .route("/users", get(handlers::users::list_users))
        // GET /users/profile/me
        // The caller's own profile with post count.
        .route("/users/profile/me", get(handlers::users::get_me))
        // PUT/DELETE /users/profile
        // Partial profile update and full account deletion (cascades to the
        // caller's posts). Both target the caller; no id is accepted.
        .route(
            "/users/profile",
            put(handlers::users::update_profile).delete(handlers::users::delete_account),
        )
        // GET /users/{id} and the legacy PUT /users/{id}
        // Profile by id, and the per-id update form that rejects any target
        // other than the caller with 403 UNAUTHORIZED_UPDATE.
        .route(
            "/users/{id}",
            get(handlers::users::get_user).put(handlers::users::update_user_by_id),
        )
        // GET /users/{id}/posts
        // One user's posts, newest first; 404 if the user is gone.
        .route("/users/{id}/posts", get(handlers::users::list_user_posts))
}
