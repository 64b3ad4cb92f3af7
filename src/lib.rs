use axum::{
    extract::{FromRef, Request},
    http::HeaderName,
    Router,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core services: identity, persistence, validation, error taxonomy.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod password;
pub mod repository;
pub mod validation;

// Route tables, split by access level (public vs. bearer-gated).
pub mod routes;
use routes::{authenticated, public};
use auth::AuthUser;

// Re-exported so main.rs (and the test suites) can assemble state tersely.
pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the
/// OpenAPI document served at `/api-docs/openapi.json` (and browsable through
/// the Swagger UI mounted in `create_router`).
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register, handlers::auth::login, handlers::auth::verify,
        handlers::posts::create_post, handlers::posts::list_posts, handlers::posts::search_posts,
        handlers::posts::get_post, handlers::posts::update_post, handlers::posts::delete_post,
        handlers::users::get_user, handlers::users::get_me, handlers::users::update_profile,
        handlers::users::update_user_by_id, handlers::users::list_users,
        handlers::users::list_user_posts, handlers::users::delete_account
    ),
    components(
        schemas(
            models::PublicUser, models::UserProfile, models::Post,
            models::RegisterRequest, models::LoginRequest,
            models::CreatePostRequest, models::UpdatePostRequest, models::UpdateProfileRequest,
            models::AuthResponse, models::UserResponse, models::ProfileResponse,
            models::PostResponse, models::PostListResponse, models::SearchPostsResponse,
            models::UserListResponse, models::MessageResponse,
            pagination::PageMeta,
        )
    ),
    tags(
        (name = "linkhub", description = "LinkHub Social Network API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for everything a request handler needs: the
/// repository behind its trait object and the immutable configuration. Cloned
/// per request; both members are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Persistence, behind the narrow `Repository` trait.
    pub repo: RepositoryState,
    /// Environment configuration, loaded once at startup.
    pub config: AppConfig,
}

// FromRef lets the AuthUser extractor pull just the repository and the JWT
// secret out of the state without depending on the whole struct.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Gates the authenticated route tree. Running the `AuthUser` extractor is
/// the whole job: a failed extraction short-circuits with the matching
/// `{message, error}` rejection before the handler runs, a successful one
/// lets the request through (handlers re-extract the identity themselves
/// where they need it).
async fn auth_middleware(
    _auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Response {
    next.run(request).await
}

/// create_router
///
/// Builds the full application router: docs, public routes, the gated tree,
/// and the observability layers around all of it.
pub fn create_router(state: AppState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        // Swagger UI plus the raw OpenAPI JSON it renders.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Routes anyone may call: health, register, login.
        .merge(public::public_routes())
        // Everything else sits behind the bearer gate. Ownership checks
        // inside the mutating handlers are the second line of defense.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware
                ))
        )
        .with_state(state);

    // Outermost layers: every request gets a correlation id, a tracing span
    // carrying that id, and the id echoed back in the response headers.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(request_span)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis)
                        )
                )
                .layer(PropagateRequestIdLayer::new(x_request_id))
        )
        // Permissive CORS: the SPA is served from a different origin.
        .layer(
            CorsLayer::new()
                .allow_methods(Any)
                .allow_origin(Any)
                .allow_headers(Any),
        )
}

/// Span constructor for `TraceLayer`: method, URI and the generated request
/// id, so every log line within one request correlates.
fn request_span(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
