use linkhub::{
    models::{NewUser, UserPatch},
    repository::{PostFilter, PostgresRepository, Repository, RepositoryError},
};
use sqlx::PgPool;
use tokio::test;
use uuid::Uuid;

// --- Test Context and Setup ---

/// A simple structure to hold the database pool for testing.
struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    /// Connect and migrate, or `None` when no DATABASE_URL is configured so
    /// the suite passes on machines without a Postgres instance.
    async fn try_setup() -> Option<Self> {
        dotenv::dotenv().ok();

        let Ok(db_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping Postgres repository test");
            return None;
        };

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        Some(DbTestContext { pool })
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

/// Emails must be unique across runs; the database is shared and not wiped.
fn unique_email(tag: &str) -> String {
    format!("{}-{}@test.com", tag, Uuid::new_v4())
}

fn new_user(name: &str, email: String) -> NewUser {
    NewUser {
        name: name.to_string(),
        email,
        password_hash: "$argon2id$test-hash".to_string(),
        bio: None,
    }
}

// --- Tests ---

#[test]
async fn test_insert_and_find_user_round_trip() {
    let Some(ctx) = DbTestContext::try_setup().await else {
        return;
    };
    let repo = ctx.repository();

    let email = unique_email("roundtrip");
    let created = repo
        .insert_user(new_user("Round Trip", email.clone()))
        .await
        .expect("insert user");

    let by_id = repo.find_user_by_id(created.id).await.unwrap();
    assert_eq!(by_id.as_ref().map(|u| u.email.as_str()), Some(email.as_str()));

    let by_email = repo.find_user_by_email(&email).await.unwrap();
    assert_eq!(by_email.map(|u| u.id), Some(created.id));

    assert!(repo.delete_user_cascade(created.id).await.unwrap());
}

#[test]
async fn test_duplicate_email_maps_to_duplicate_error() {
    let Some(ctx) = DbTestContext::try_setup().await else {
        return;
    };
    let repo = ctx.repository();

    let email = unique_email("dup");
    let first = repo
        .insert_user(new_user("First", email.clone()))
        .await
        .unwrap();

    // The unique constraint, not a pre-check, is what fires here.
    let err = repo
        .insert_user(new_user("Second", email))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate(_)));

    assert!(repo.delete_user_cascade(first.id).await.unwrap());
}

#[test]
async fn test_insert_post_returns_the_owner_joined_view() {
    let Some(ctx) = DbTestContext::try_setup().await else {
        return;
    };
    let repo = ctx.repository();
    let user = repo
        .insert_user(new_user("Poster", unique_email("poster")))
        .await
        .unwrap();

    let post = repo.insert_post(user.id, "joined at birth").await.unwrap();
    assert_eq!(post.user_id, user.id);
    assert_eq!(post.user_name, "Poster");

    let fetched = repo.find_post_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(fetched.content, "joined at birth");
    assert_eq!(fetched.user_name, "Poster");

    assert!(repo.delete_user_cascade(user.id).await.unwrap());
}

#[test]
async fn test_list_posts_pages_are_ordered_and_disjoint() {
    let Some(ctx) = DbTestContext::try_setup().await else {
        return;
    };
    let repo = ctx.repository();
    let user = repo
        .insert_user(new_user("Pager", unique_email("pager")))
        .await
        .unwrap();

    for i in 0..5 {
        repo.insert_post(user.id, &format!("page fodder {i}"))
            .await
            .unwrap();
    }

    // Scope to this author so rows from other runs cannot interfere.
    let filter = PostFilter::ByAuthor(user.id);
    assert_eq!(repo.count_posts(&filter).await.unwrap(), 5);

    let mut seen = Vec::new();
    let mut previous_newest = None;
    for page in 0..3 {
        let posts = repo.list_posts(&filter, 2, page * 2).await.unwrap();
        for pair in posts.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
        if let (Some(prev), Some(first)) = (previous_newest, posts.first()) {
            assert!(prev >= first.created_at, "pages must not run forward");
        }
        previous_newest = posts.last().map(|p| p.created_at);
        seen.extend(posts.into_iter().map(|p| p.id));
    }

    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 5, "three pages of two must cover all five posts");

    assert!(repo.delete_user_cascade(user.id).await.unwrap());
}

#[test]
async fn test_content_search_matches_case_insensitively() {
    let Some(ctx) = DbTestContext::try_setup().await else {
        return;
    };
    let repo = ctx.repository();
    let user = repo
        .insert_user(new_user("Seeker", unique_email("seeker")))
        .await
        .unwrap();

    // A needle no other test run can collide with.
    let needle = format!("Needle-{}", Uuid::new_v4().simple());
    repo.insert_post(user.id, &format!("hidden {} in here", needle.to_uppercase()))
        .await
        .unwrap();
    repo.insert_post(user.id, "nothing to see").await.unwrap();

    let filter = PostFilter::ContentMatch(needle.to_lowercase());
    assert_eq!(repo.count_posts(&filter).await.unwrap(), 1);
    let posts = repo.list_posts(&filter, 10, 0).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].content.contains("hidden"));

    assert!(repo.delete_user_cascade(user.id).await.unwrap());
}

#[test]
async fn test_update_user_patch_touches_only_provided_fields() {
    let Some(ctx) = DbTestContext::try_setup().await else {
        return;
    };
    let repo = ctx.repository();
    let user = repo
        .insert_user(new_user("Patchy", unique_email("patchy")))
        .await
        .unwrap();

    let updated = repo
        .update_user(
            user.id,
            UserPatch {
                name: None,
                bio: Some("kept around".to_string()),
                avatar_url: None,
            },
        )
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(updated.name, "Patchy");
    assert_eq!(updated.bio.as_deref(), Some("kept around"));

    let renamed = repo
        .update_user(
            user.id,
            UserPatch {
                name: Some("Renamed".to_string()),
                bio: None,
                avatar_url: None,
            },
        )
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(renamed.name, "Renamed");
    // COALESCE left the bio from the previous patch in place.
    assert_eq!(renamed.bio.as_deref(), Some("kept around"));

    // Patching a vanished user reports None, not an error.
    let missing = repo
        .update_user(
            Uuid::new_v4(),
            UserPatch {
                name: Some("Ghost".to_string()),
                bio: None,
                avatar_url: None,
            },
        )
        .await
        .unwrap();
    assert!(missing.is_none());

    assert!(repo.delete_user_cascade(user.id).await.unwrap());
}

#[test]
async fn test_update_post_changes_content_but_not_creation_time() {
    let Some(ctx) = DbTestContext::try_setup().await else {
        return;
    };
    let repo = ctx.repository();
    let user = repo
        .insert_user(new_user("Editor", unique_email("editor")))
        .await
        .unwrap();
    let post = repo.insert_post(user.id, "draft").await.unwrap();

    let updated = repo
        .update_post(post.id, "final")
        .await
        .unwrap()
        .expect("post exists");
    assert_eq!(updated.content, "final");
    assert_eq!(updated.created_at, post.created_at);
    assert!(updated.updated_at >= post.updated_at);

    let missing = repo.update_post(Uuid::new_v4(), "nowhere").await.unwrap();
    assert!(missing.is_none());

    assert!(repo.delete_user_cascade(user.id).await.unwrap());
}

#[test]
async fn test_cascade_delete_removes_owned_posts() {
    let Some(ctx) = DbTestContext::try_setup().await else {
        return;
    };
    let repo = ctx.repository();
    let user = repo
        .insert_user(new_user("Leaver", unique_email("leaver")))
        .await
        .unwrap();
    let first = repo.insert_post(user.id, "one").await.unwrap();
    let second = repo.insert_post(user.id, "two").await.unwrap();

    assert!(repo.delete_user_cascade(user.id).await.unwrap());

    // The FK cascade took the posts with the account.
    assert!(repo.find_post_by_id(first.id).await.unwrap().is_none());
    assert!(repo.find_post_by_id(second.id).await.unwrap().is_none());
    assert!(repo.find_user_by_id(user.id).await.unwrap().is_none());

    // Deleting what is already gone reports false, matching the handlers'
    // expectations.
    assert!(!repo.delete_user_cascade(user.id).await.unwrap());
    assert!(!repo.delete_post(first.id).await.unwrap());
}

#[test]
async fn test_user_search_matches_name_or_email() {
    let Some(ctx) = DbTestContext::try_setup().await else {
        return;
    };
    let repo = ctx.repository();

    let name_marker = format!("Marker{}", Uuid::new_v4().simple());
    let email_marker = format!("tag{}", Uuid::new_v4().simple());

    let by_name = repo
        .insert_user(new_user(&name_marker, unique_email("byname")))
        .await
        .unwrap();
    let by_email = repo
        .insert_user(new_user(
            "Plain Name",
            format!("{}@test.com", email_marker),
        ))
        .await
        .unwrap();

    // Case flipped on purpose: the match is ILIKE on either column.
    let found = repo
        .list_users(Some(&name_marker.to_uppercase()), 10, 0)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, by_name.id);

    assert_eq!(
        repo.count_users(Some(&email_marker)).await.unwrap(),
        1,
        "email fragment must match too"
    );

    assert!(repo.delete_user_cascade(by_name.id).await.unwrap());
    assert!(repo.delete_user_cascade(by_email.id).await.unwrap());
}
