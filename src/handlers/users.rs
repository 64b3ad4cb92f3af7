use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{
        MessageResponse, PostListResponse, ProfileResponse, PublicUser, UpdateProfileRequest,
        UserListResponse, UserPatch, UserProfile, UserResponse,
    },
    pagination::{DEFAULT_POST_LIMIT, DEFAULT_USER_LIMIT, PageMeta, PageQuery},
    repository::PostFilter,
    validation,
};

// --- Filter Structs ---

/// UserListQuery
///
/// Defines the accepted query parameters for the user discovery endpoint
/// (GET /users). Default page size is 20, larger than the post feed's.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct UserListQuery {
    /// Optional case-insensitive match against name or email.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: Option<i64>,
    /// Page size, clamped to 1..=100.
    pub limit: Option<i64>,
}

fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidUserId)
}

/// Validate each provided field of a profile update; untouched fields stay
/// `None` all the way to the repository.
fn build_patch(payload: &UpdateProfileRequest) -> Result<UserPatch, ApiError> {
    Ok(UserPatch {
        name: match payload.name.as_deref() {
            Some(n) => Some(validation::validate_name(n)?),
            None => None,
        },
        bio: match payload.bio.as_deref() {
            Some(b) => Some(validation::validate_bio(b)?),
            None => None,
        },
        avatar_url: match payload.avatar_url.as_deref() {
            Some(u) => Some(validation::validate_avatar_url(u)?),
            None => None,
        },
    })
}

// --- Handlers ---

/// get_user
///
/// [Authenticated Route] A user's public profile plus their post count,
/// derived at read time.
#[utoipa::path(
    get,
    path = "/users/{id}",
    responses(
        (status = 200, description = "The profile", body = ProfileResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "No such user")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let id = parse_user_id(&id)?;

    let user = state
        .repo
        .find_user_by_id(id)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    let post_count = state.repo.count_posts(&PostFilter::ByAuthor(id)).await?;

    Ok(Json(ProfileResponse {
        message: "User retrieved successfully".to_string(),
        user: UserProfile::new(user.into(), post_count),
    }))
}

/// get_me
///
/// [Authenticated Route] The caller's own profile, same shape as `get_user`.
/// The identity comes straight from the extractor; only the count needs the
/// repository.
#[utoipa::path(
    get,
    path = "/users/profile/me",
    responses((status = 200, description = "Caller's profile", body = ProfileResponse))
)]
pub async fn get_me(
    AuthUser { id, user }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let post_count = state.repo.count_posts(&PostFilter::ByAuthor(id)).await?;

    Ok(Json(ProfileResponse {
        message: "User retrieved successfully".to_string(),
        user: UserProfile::new(user, post_count),
    }))
}

/// update_profile
///
/// [Authenticated Route] Partial update of the caller's own profile. At least
/// one of name, bio or avatar_url must be provided; whatever is omitted stays
/// exactly as it was.
#[utoipa::path(
    put,
    path = "/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "No fields, or a field failed validation")
    )
)]
pub async fn update_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let patch = build_patch(&payload)?;
    if patch.is_empty() {
        return Err(ApiError::NoUpdateFields);
    }

    let user = state
        .repo
        .update_user(id, patch)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(UserResponse {
        message: "Profile updated successfully".to_string(),
        user: user.into(),
    }))
}

/// update_user_by_id
///
/// [Authenticated Route] Legacy per-id form of the profile update. The target
/// must be the caller; any other id is rejected before the payload is even
/// looked at.
#[utoipa::path(
    put,
    path = "/users/{id}",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 403, description = "Target is not the caller")
    )
)]
pub async fn update_user_by_id(
    AuthUser { id: caller_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let target = parse_user_id(&id)?;
    if target != caller_id {
        return Err(ApiError::UnauthorizedUpdate);
    }

    let patch = build_patch(&payload)?;
    if patch.is_empty() {
        return Err(ApiError::NoUpdateFields);
    }

    let user = state
        .repo
        .update_user(caller_id, patch)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(UserResponse {
        message: "Profile updated successfully".to_string(),
        user: user.into(),
    }))
}

/// list_users
///
/// [Authenticated Route] Paginated user discovery with optional name/email
/// search. List items carry no post counts; that would cost one count query
/// per row.
#[utoipa::path(
    get,
    path = "/users",
    params(UserListQuery),
    responses((status = 200, description = "One page of users", body = UserListResponse))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let window = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_USER_LIMIT);

    let users = state
        .repo
        .list_users(search, window.limit, window.offset)
        .await?;
    let total = state.repo.count_users(search).await?;

    Ok(Json(UserListResponse {
        message: "Users retrieved successfully".to_string(),
        users: users.into_iter().map(PublicUser::from).collect(),
        pagination: PageMeta::new(&window, total),
    }))
}

/// list_user_posts
///
/// [Authenticated Route] One user's posts, newest first. A vanished user is a
/// 404, not an empty page: clients need to tell the two apart.
#[utoipa::path(
    get,
    path = "/users/{id}/posts",
    params(PageQuery),
    responses(
        (status = 200, description = "The user's posts", body = PostListResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "No such user")
    )
)]
pub async fn list_user_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let id = parse_user_id(&id)?;

    if state.repo.find_user_by_id(id).await?.is_none() {
        return Err(ApiError::UserNotFound);
    }

    let window = query.resolve(DEFAULT_POST_LIMIT);
    let filter = PostFilter::ByAuthor(id);

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

/// delete_account
///
/// [Authenticated Route] Deletes the caller's account and every post they
/// own. The issued tokens keep decoding until they expire, but the gate's
/// subject lookup turns them away the moment this returns.
#[utoipa::path(
    delete,
    path = "/users/profile",
    responses((status = 200, description = "Account removed", body = MessageResponse))
)]
pub async fn delete_account(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.repo.delete_user_cascade(id).await? {
        return Err(ApiError::UserNotFound);
    }

    Ok(Json(MessageResponse {
        message: "Account deleted successfully".to_string(),
    }))
}
