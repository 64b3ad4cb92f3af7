use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewUser, Post, User, UserPatch};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// RepositoryError
///
/// Failures a storage adapter can report. `Duplicate` names the violated key
/// so callers can map it onto the right client error; `Database` is an
/// infrastructure fault that the edge turns into an opaque 500.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("duplicate key: {0}")]
    Duplicate(&'static str),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// PostFilter
///
/// Scope selector shared by post listings and their counts. Handlers pass the
/// same filter to `list_posts` and `count_posts`, so the pagination summary
/// can never disagree with the rows it describes.
#[derive(Debug, Clone)]
pub enum PostFilter {
    /// The global feed.
    All,
    /// Posts owned by one user.
    ByAuthor(Uuid),
    /// Case-insensitive content match.
    ContentMatch(String),
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the
/// core of the Repository Abstraction pattern, allowing the handlers to
/// interact with the data layer without knowing the specific implementation
/// (Postgres, in-memory, etc.). Ownership decisions live in the handlers;
/// adapters only move rows.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's asynchronous task
/// boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    /// Lookup by canonical (trimmed, lowercased) email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    /// Inserts a user. A taken email yields `RepositoryError::Duplicate`.
    async fn insert_user(&self, new_user: NewUser) -> Result<User, RepositoryError>;
    /// Partial update: `None` fields stay untouched. Returns the updated row,
    /// or `None` when no such user exists.
    async fn update_user(
        &self,
        id: Uuid,
        patch: UserPatch,
    ) -> Result<Option<User>, RepositoryError>;
    /// Removes the user together with every post they own. Returns false when
    /// the user was already gone.
    async fn delete_user_cascade(&self, id: Uuid) -> Result<bool, RepositoryError>;
    /// Discovery listing, ordered `name ASC, id ASC`. `search` matches name
    /// or email, case-insensitively.
    async fn list_users(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, RepositoryError>;
    async fn count_users(&self, search: Option<&str>) -> Result<i64, RepositoryError>;

    // --- Posts ---
    /// Inserts a post and returns it already joined with the owner's display
    /// fields, so creation responses match every other post response.
    async fn insert_post(&self, user_id: Uuid, content: &str) -> Result<Post, RepositoryError>;
    async fn find_post_by_id(&self, id: Uuid) -> Result<Option<Post>, RepositoryError>;
    /// One page of the filtered listing, ordered `created_at DESC, id DESC`.
    async fn list_posts(
        &self,
        filter: &PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, RepositoryError>;
    async fn count_posts(&self, filter: &PostFilter) -> Result<i64, RepositoryError>;
    /// Replaces the content and refreshes `updated_at`. Ownership is checked
    /// by the caller before this is reached.
    async fn update_post(&self, id: Uuid, content: &str)
    -> Result<Option<Post>, RepositoryError>;
    async fn delete_post(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;
