use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{PostFilter, Repository, RepositoryError};
use crate::models::{NewUser, Post, User, UserPatch};

/// InMemoryRepository
///
/// A complete `Repository` adapter over process memory. It backs the
/// integration test suites and doubles as proof that the handlers depend only
/// on the trait: the contracts the Postgres adapter honors (listing order,
/// email uniqueness, cascade on account deletion) are honored here too.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, StoredPost>,
}

/// Raw post row. The owner join happens at read time, mirroring the SQL
/// adapter's SELECT shape.
#[derive(Debug, Clone)]
struct StoredPost {
    id: Uuid,
    user_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // The lock is only held across synchronous map work, never an await.
        self.state.lock().expect("in-memory repository poisoned")
    }
}

impl MemoryState {
    /// Join a stored post with its owner's display fields. Cascade deletion
    /// keeps owners around for every live post, so a miss means the post is
    /// effectively gone.
    fn view(&self, post: &StoredPost) -> Option<Post> {
        let owner = self.users.get(&post.user_id)?;
        Some(Post {
            id: post.id,
            content: post.content.clone(),
            created_at: post.created_at,
            updated_at: post.updated_at,
            user_id: post.user_id,
            user_name: owner.name.clone(),
            user_avatar: owner.avatar_url.clone(),
        })
    }
}

fn matches_filter(post: &StoredPost, filter: &PostFilter) -> bool {
    match filter {
        PostFilter::All => true,
        PostFilter::ByAuthor(user_id) => post.user_id == *user_id,
        PostFilter::ContentMatch(q) => post
            .content
            .to_lowercase()
            .contains(&q.to_lowercase()),
    }
}

fn matches_search(user: &User, search: Option<&str>) -> bool {
    match search {
        None => true,
        Some(s) => {
            let needle = s.to_lowercase();
            user.name.to_lowercase().contains(&needle)
                || user.email.to_lowercase().contains(&needle)
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.state();
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.state().users.get(&id).cloned())
    }

    async fn insert_user(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state();
        if state.users.values().any(|u| u.email == new_user.email) {
            return Err(RepositoryError::Duplicate("users.email"));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            bio: new_user.bio,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        id: Uuid,
        patch: UserPatch,
    ) -> Result<Option<User>, RepositoryError> {
        let mut state = self.state();
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(bio) = patch.bio {
            user.bio = Some(bio);
        }
        if let Some(avatar_url) = patch.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user_cascade(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut state = self.state();
        let existed = state.users.remove(&id).is_some();
        if existed {
            state.posts.retain(|_, p| p.user_id != id);
        }
        Ok(existed)
    }

    async fn list_users(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, RepositoryError> {
        let state = self.state();
        let mut users: Vec<&User> = state
            .users
            .values()
            .filter(|u| matches_search(u, search))
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(users
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_users(&self, search: Option<&str>) -> Result<i64, RepositoryError> {
        let state = self.state();
        Ok(state
            .users
            .values()
            .filter(|u| matches_search(u, search))
            .count() as i64)
    }

    async fn insert_post(&self, user_id: Uuid, content: &str) -> Result<Post, RepositoryError> {
        let mut state = self.state();
        let now = Utc::now();
        let post = StoredPost {
            id: Uuid::new_v4(),
            user_id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        let view = state.view(&post).ok_or(RepositoryError::Database(
            sqlx::Error::RowNotFound,
        ))?;
        state.posts.insert(post.id, post);
        Ok(view)
    }

    async fn find_post_by_id(&self, id: Uuid) -> Result<Option<Post>, RepositoryError> {
        let state = self.state();
        Ok(state.posts.get(&id).and_then(|p| state.view(p)))
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, RepositoryError> {
        let state = self.state();
        let mut posts: Vec<&StoredPost> = state
            .posts
            .values()
            .filter(|p| matches_filter(p, filter))
            .collect();
        // Newest first, ids breaking timestamp ties, same as the SQL ORDER BY.
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .filter_map(|p| state.view(p))
            .collect())
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<i64, RepositoryError> {
        let state = self.state();
        Ok(state
            .posts
            .values()
            .filter(|p| matches_filter(p, filter))
            .count() as i64)
    }

    async fn update_post(
        &self,
        id: Uuid,
        content: &str,
    ) -> Result<Option<Post>, RepositoryError> {
        let mut state = self.state();
        let Some(post) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        post.content = content.to_string();
        post.updated_at = Utc::now();
        let post = post.clone();
        Ok(state.view(&post))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.state().posts.remove(&id).is_some())
    }
}
