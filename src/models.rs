use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::pagination::PageMeta;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The canonical identity record stored in the `users` table. This is an
/// internal row type: the password hash rides along for credential checks but
/// is never serialized, and the struct itself never appears in a response;
/// handlers shape it into `PublicUser` or `UserProfile` first.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    // Stored trimmed and lowercased; uniqueness is enforced on this form.
    pub email: String,
    // Argon2 PHC string. Excluded from serialization as a second line of
    // defense on top of the public response types.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// PublicUser
///
/// The user as every response shows it: identity and display fields only.
/// All shaping of a `User` row into its public form goes through the single
/// `From<User>` conversion below.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            bio: user.bio,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
        }
    }
}

/// UserProfile
///
/// A `PublicUser` augmented with the post count, which is derived at read
/// time rather than stored (stale counters can't drift if they don't exist).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    // Spelled the way the wire contract has always spelled it.
    #[serde(rename = "postCount")]
    pub post_count: i64,
}

impl UserProfile {
    pub fn new(user: PublicUser, post_count: i64) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            bio: user.bio,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
            post_count,
        }
    }
}

/// Post
///
/// A post as the API returns it: the `posts` row joined with the owner's
/// display fields. The join happens once, in the repository adapter, so every
/// route hands out the same shape.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: Uuid,
    pub content: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    // FK to users.id (Owner).
    pub user_id: Uuid,
    // Loaded via a JOIN in the repository query.
    pub user_name: String,
    pub user_avatar: Option<String>,
}

// --- Repository Input Schemas (Internal) ---

/// NewUser
///
/// Insert payload handed to the repository after validation and hashing.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
}

/// UserPatch
///
/// Partial profile update for the repository: `None` means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.bio.is_none() && self.avatar_url.is_none()
    }
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /auth/register).
/// Note: the password only exists in memory long enough to be hashed; it is
/// never persisted or logged in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// LoginRequest
///
/// Input payload for POST /auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// CreatePostRequest
///
/// Input payload for POST /posts.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    pub content: String,
}

/// UpdatePostRequest
///
/// Input payload for PUT /posts/{id}. Only the content is mutable; owner and
/// creation time are fixed for the life of the post.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    pub content: String,
}

/// UpdateProfileRequest
///
/// Partial update payload for PUT /users/profile.
///
/// Uses `Option<T>` for all fields and `#[serde(skip_serializing_if = "Option::is_none")]`
/// so only the provided fields travel in the JSON payload; omitted fields are
/// left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

// --- Response Envelopes (Output Schemas) ---

/// AuthResponse
///
/// Output for register and login: the public user plus a freshly minted
/// bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthResponse {
    pub message: String,
    pub user: PublicUser,
    pub token: String,
}

/// UserResponse
///
/// Output for verify and profile updates: a public user, no derived count.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserResponse {
    pub message: String,
    pub user: PublicUser,
}

/// ProfileResponse
///
/// Output for profile reads, where the post count is included.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserProfile,
}

/// PostResponse
///
/// Output wrapping a single post (create, get, update).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostResponse {
    pub message: String,
    pub post: Post,
}

/// PostListResponse
///
/// Output for the feed and per-user listings: one page of posts plus the
/// pagination summary.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostListResponse {
    pub message: String,
    pub posts: Vec<Post>,
    pub pagination: PageMeta,
}

/// SearchPostsResponse
///
/// Output for GET /posts/search. Echoes the trimmed query back so clients can
/// label result sets without tracking request state.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SearchPostsResponse {
    pub message: String,
    pub query: String,
    pub posts: Vec<Post>,
    pub pagination: PageMeta,
}

/// UserListResponse
///
/// Output for GET /users discovery listings.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserListResponse {
    pub message: String,
    pub users: Vec<PublicUser>,
    pub pagination: PageMeta,
}

/// MessageResponse
///
/// Output for deletions and other acknowledgement-only operations.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}
