use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use uuid::Uuid;

use super::{PostFilter, Repository, RepositoryError};
use crate::models::{NewUser, Post, User, UserPatch};

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database. All dynamic SQL goes through `QueryBuilder` with
/// bound parameters; nothing from the request is ever interpolated into the
/// query text.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append the WHERE clause for a post filter. Shared by the listing and the
/// count so both always see the same scope.
fn push_post_filter(builder: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::ByAuthor(user_id) => {
            builder.push(" WHERE p.user_id = ");
            builder.push_bind(*user_id);
        }
        PostFilter::ContentMatch(q) => {
            // Case-insensitive containment. LIKE metacharacters in the query
            // keep their pattern meaning, same as the listing always behaved.
            builder.push(" WHERE p.content ILIKE ");
            builder.push_bind(format!("%{}%", q));
        }
    }
}

/// Append the WHERE clause for the user discovery search (name OR email).
fn push_user_search(builder: &mut QueryBuilder<'_, sqlx::Postgres>, search: Option<&str>) {
    if let Some(s) = search {
        let pattern = format!("%{}%", s);
        builder.push(" WHERE (name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR email ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

/// Distinguish a unique-key violation (the email column) from other database
/// failures on insert.
fn map_insert_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return RepositoryError::Duplicate("users.email");
        }
    }
    RepositoryError::Database(e)
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, name, email, password_hash, bio, avatar_url, created_at, updated_at
               FROM users
               WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, name, email, password_hash, bio, avatar_url, created_at, updated_at
               FROM users
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// insert_user
    ///
    /// Inserts a new user row. The id is generated application-side so the
    /// caller never round-trips for it. A concurrent registration with the
    /// same email loses on the unique constraint and surfaces as `Duplicate`.
    async fn insert_user(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (id, name, email, password_hash, bio, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
               RETURNING id, name, email, password_hash, bio, avatar_url, created_at, updated_at"#,
        )
        .bind(new_id)
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.bio)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    /// update_user
    ///
    /// Partial profile update. Uses the PostgreSQL `COALESCE` function to
    /// handle `Option<T>` fields, touching a column only when the
    /// corresponding field is `Some`.
    async fn update_user(
        &self,
        id: Uuid,
        patch: UserPatch,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"UPDATE users
               SET name = COALESCE($2, name),
                   bio = COALESCE($3, bio),
                   avatar_url = COALESCE($4, avatar_url),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING id, name, email, password_hash, bio, avatar_url, created_at, updated_at"#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.bio)
        .bind(patch.avatar_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// delete_user_cascade
    ///
    /// Removes the account. The posts go with it through the foreign key's
    /// `ON DELETE CASCADE`, so user and posts disappear in one atomic
    /// statement.
    async fn delete_user_cascade(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// list_users
    ///
    /// Discovery listing with optional search, built with QueryBuilder for
    /// safe parameterization. Ordered by `name ASC, id ASC`, a total order,
    /// so consecutive pages never overlap.
    async fn list_users(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, RepositoryError> {
        let mut builder: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(
            r#"SELECT id, name, email, password_hash, bio, avatar_url, created_at, updated_at
               FROM users"#,
        );
        push_user_search(&mut builder, search);
        builder.push(" ORDER BY name ASC, id ASC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let users = builder
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn count_users(&self, search: Option<&str>) -> Result<i64, RepositoryError> {
        let mut builder: QueryBuilder<'_, sqlx::Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM users");
        push_user_search(&mut builder, search);

        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// insert_post
    ///
    /// Uses a CTE (Common Table Expression) to perform the insert and the
    /// owner join in one query, so the response shape matches every other
    /// post read without a second round trip.
    async fn insert_post(&self, user_id: Uuid, content: &str) -> Result<Post, RepositoryError> {
        let new_id = Uuid::new_v4();
        let post = sqlx::query_as::<_, Post>(
            r#"
            WITH inserted AS (
                INSERT INTO posts (id, user_id, content, created_at, updated_at)
                VALUES ($1, $2, $3, NOW(), NOW())
                RETURNING id, user_id, content, created_at, updated_at
            )
            SELECT p.id, p.content, p.created_at, p.updated_at, p.user_id,
                   u.name AS user_name, u.avatar_url AS user_avatar
            FROM inserted p JOIN users u ON p.user_id = u.id
            "#,
        )
        .bind(new_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    async fn find_post_by_id(&self, id: Uuid) -> Result<Option<Post>, RepositoryError> {
        let post = sqlx::query_as::<_, Post>(
            r#"SELECT p.id, p.content, p.created_at, p.updated_at, p.user_id,
                      u.name AS user_name, u.avatar_url AS user_avatar
               FROM posts p JOIN users u ON p.user_id = u.id
               WHERE p.id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    /// list_posts
    ///
    /// One page of the filtered feed. Newest first; ties on the timestamp are
    /// broken by id so the order is total and pages stay disjoint.
    async fn list_posts(
        &self,
        filter: &PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, RepositoryError> {
        let mut builder: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(
            r#"SELECT p.id, p.content, p.created_at, p.updated_at, p.user_id,
                      u.name AS user_name, u.avatar_url AS user_avatar
               FROM posts p JOIN users u ON p.user_id = u.id"#,
        );
        push_post_filter(&mut builder, filter);
        builder.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let posts = builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<i64, RepositoryError> {
        let mut builder: QueryBuilder<'_, sqlx::Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM posts p");
        push_post_filter(&mut builder, filter);

        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// update_post
    ///
    /// Content-only update; `created_at` and ownership never change. The same
    /// CTE-plus-join shape as `insert_post` keeps the returned row complete.
    async fn update_post(
        &self,
        id: Uuid,
        content: &str,
    ) -> Result<Option<Post>, RepositoryError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            WITH updated AS (
                UPDATE posts SET content = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING id, user_id, content, created_at, updated_at
            )
            SELECT p.id, p.content, p.created_at, p.updated_at, p.user_id,
                   u.name AS user_name, u.avatar_url AS user_avatar
            FROM updated p JOIN users u ON p.user_id = u.id
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
