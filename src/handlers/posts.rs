use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{
        CreatePostRequest, MessageResponse, PostListResponse, PostResponse, SearchPostsResponse,
        UpdatePostRequest,
    },
    pagination::{DEFAULT_POST_LIMIT, PageMeta, PageQuery},
    repository::PostFilter,
    validation,
};

// --- Filter Structs ---

/// SearchQuery
///
/// Defines the accepted query parameters for the post search endpoint
/// (GET /posts/search). Pagination follows the same contract as the feed.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Substring to look for in post content. Required, non-empty after trim.
    pub q: Option<String>,
    /// 1-based page number.
    pub page: Option<i64>,
    /// Page size, clamped to 1..=100.
    pub limit: Option<i64>,
}

/// Path ids arrive as raw strings so a malformed value maps to the documented
/// 400 instead of Axum's generic rejection.
fn parse_post_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidPostId)
}

// --- Handlers ---

/// create_post
///
/// [Authenticated Route] Publishes a new post owned by the caller. The stored
/// content is the trimmed form; the response carries the post already joined
/// with the owner's display fields.
#[utoipa::path(
    post,
    path = "/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Empty or oversized content")
    )
)]
pub async fn create_post(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let content = validation::validate_content(&payload.content)?;
    let post = state.repo.insert_post(user_id, &content).await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            message: "Post created successfully".to_string(),
            post,
        }),
    ))
}

/// list_posts
///
/// [Authenticated Route] The global feed: newest first, one page at a time.
/// A page past the end of the data is an empty 200, not an error.
#[utoipa::path(
    get,
    path = "/posts",
    params(PageQuery),
    responses((status = 200, description = "One page of the feed", body = PostListResponse))
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let window = query.resolve(DEFAULT_POST_LIMIT);
    let filter = PostFilter::All;

    let posts = state
        .repo
        .list_posts(&filter, window.limit, window.offset)
        .await?;
    let total = state.repo.count_posts(&filter).await?;

    Ok(Json(PostListResponse {
        message: "Posts retrieved successfully".to_string(),
        posts,
        pagination: PageMeta::new(&window, total),
    }))
}

/// search_posts
///
/// [Authenticated Route] Case-insensitive content search with the same
/// pagination contract as the feed. The trimmed query is echoed back so
/// clients can label the result set.
#[utoipa::path(
    get,
    path = "/posts/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching posts", body = SearchPostsResponse),
        (status = 400, description = "Missing or empty query")
    )
)]
pub async fn search_posts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchPostsResponse>, ApiError> {
    let q = query.q.as_deref().map(str::trim).unwrap_or("");
    if q.is_empty() {
        return Err(ApiError::SearchQueryRequired);
    }

    let window = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_POST_LIMIT);
    let filter = PostFilter::ContentMatch(q.to_string());

    let posts = state
        .repo
        .list_posts(&filter, window.limit, window.offset)
        .await?;
    let total = state.repo.count_posts(&filter).await?;

    Ok(Json(SearchPostsResponse {
        message: "Search completed successfully".to_string(),
        query: q.to_string(),
        posts,
        pagination: PageMeta::new(&window, total),
    }))
}

/// get_post
///
/// [Authenticated Route] Retrieves a single post with its owner's display
/// fields.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    responses(
        (status = 200, description = "The post", body = PostResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "No such post")
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    let id = parse_post_id(&id)?;

    let post = state
        .repo
        .find_post_by_id(id)
        .await?
        .ok_or(ApiError::PostNotFound)?;

    Ok(Json(PostResponse {
        message: "Post retrieved successfully".to_string(),
        post,
    }))
}

/// update_post
///
/// [Authenticated Route] Replaces the content of the caller's own post.
///
/// *Authorization*: existence is checked first (404), then ownership (403),
/// and only then is anything validated or written. Owner and creation time
/// never change; `updated_at` is refreshed by the repository.
#[utoipa::path(
    put,
    path = "/posts/{id}",
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated post", body = PostResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such post")
    )
)]
pub async fn update_post(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    let id = parse_post_id(&id)?;

    let existing = state
        .repo
        .find_post_by_id(id)
        .await?
        .ok_or(ApiError::PostNotFound)?;
    if existing.user_id != user_id {
        return Err(ApiError::UnauthorizedAccess("You can only edit your own posts"));
    }

    let content = validation::validate_content(&payload.content)?;
    let post = state
        .repo
        .update_post(id, &content)
        .await?
        .ok_or(ApiError::PostNotFound)?;

    Ok(Json(PostResponse {
        message: "Post updated successfully".to_string(),
        post,
    }))
}

/// delete_post
///
/// [Authenticated Route] Permanently removes the caller's own post. Same
/// existence-then-ownership ladder as update.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such post")
    )
)]
pub async fn delete_post(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_post_id(&id)?;

    let existing = state
        .repo
        .find_post_by_id(id)
        .await?
        .ok_or(ApiError::PostNotFound)?;
    if existing.user_id != user_id {
        return Err(ApiError::UnauthorizedAccess(
            "You can only delete your own posts",
        ));
    }

    state.repo.delete_post(id).await?;

    Ok(Json(MessageResponse {
        message: "Post deleted successfully".to_string(),
    }))
}
