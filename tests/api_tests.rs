use linkhub::{
    AppConfig, AppState, InMemoryRepository, create_router,
    models::{AuthResponse, PostListResponse, PostResponse, SearchPostsResponse},
    repository::RepositoryState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

/// Boot the full router (middleware stack included) on an ephemeral port,
/// backed by the in-memory repository so no database is needed.
async fn spawn_app() -> TestApp {
    let repo = Arc::new(InMemoryRepository::new()) as RepositoryState;
    let config = AppConfig::default();

    let state = AppState { repo, config };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

/// Register an account over HTTP and hand back its bearer token and id.
async fn register(
    client: &reqwest::Client,
    address: &str,
    name: &str,
    email: &str,
    password: &str,
) -> (String, Uuid) {
    let response = client
        .post(format!("{}/auth/register", address))
        .json(&serde_json::json!({ "name": name, "email": email, "password": password }))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(response.status(), 201);

    let body: AuthResponse = response.json().await.unwrap();
    (body.token, body.user.id)
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_protected_routes_reject_bad_credentials() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // No credential at all.
    let response = client
        .get(format!("{}/posts", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "MISSING_TOKEN");

    // A credential that is not a JWT.
    let response = client
        .get(format!("{}/posts", app.address))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_register_login_post_edit_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Register A and confirm login returns the same account.
    let (_, user_a) = register(&client, &app.address, "A", "a@x.com", "Aa1!aaaa").await;
    let response = client
        .post(format!("{}/auth/login", app.address))
        .json(&serde_json::json!({ "email": "a@x.com", "password": "Aa1!aaaa" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let login: AuthResponse = response.json().await.unwrap();
    assert_eq!(login.user.id, user_a);
    let token_a = login.token;

    // A posts "hello".
    let response = client
        .post(format!("{}/posts", app.address))
        .bearer_auth(&token_a)
        .json(&serde_json::json!({ "content": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let created: PostResponse = response.json().await.unwrap();
    assert_eq!(created.post.user_id, user_a);
    assert_eq!(created.post.content, "hello");

    // B may read the post but not edit it.
    let (token_b, _) = register(&client, &app.address, "B", "b@x.com", "Bb2!bbbb").await;
    let response = client
        .put(format!("{}/posts/{}", app.address, created.post.id))
        .bearer_auth(&token_b)
        .json(&serde_json::json!({ "content": "bye" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "UNAUTHORIZED_ACCESS");

    // A can, and the edit shows up in the feed, newest batch first.
    let response = client
        .put(format!("{}/posts/{}", app.address, created.post.id))
        .bearer_auth(&token_a)
        .json(&serde_json::json!({ "content": "bye" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/posts?page=1&limit=10", app.address))
        .bearer_auth(&token_b)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let feed: PostListResponse = response.json().await.unwrap();
    assert_eq!(feed.pagination.total_count, 1);
    assert_eq!(feed.posts[0].content, "bye");
    assert_eq!(feed.posts[0].user_name, "A");
}

#[tokio::test]
async fn test_search_over_http() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register(&client, &app.address, "A", "a@x.com", "Aa1!aaaa").await;

    for content in ["unique needle here", "plain chatter"] {
        let response = client
            .post(format!("{}/posts", app.address))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let response = client
        .get(format!("{}/posts/search?q=NEEDLE", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let results: SearchPostsResponse = response.json().await.unwrap();
    assert_eq!(results.query, "NEEDLE");
    assert_eq!(results.posts.len(), 1);
    assert_eq!(results.pagination.total_count, 1);

    // A search without a query is a 400, not an empty result.
    let response = client
        .get(format!("{}/posts/search", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "SEARCH_QUERY_REQUIRED");
}

#[tokio::test]
async fn test_verify_profile_and_discovery() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, user_id) = register(&client, &app.address, "Ada", "ada@x.com", "Aa1!aaaa").await;

    // verify: the token maps back to the account.
    let response = client
        .post(format!("{}/auth/verify", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user"]["id"], user_id.to_string());

    // me: carries the derived post count under its wire name.
    let response = client
        .post(format!("{}/posts", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "content": "first!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let response = client
        .get(format!("{}/users/profile/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user"]["postCount"], 1);

    // A partial profile update, then discovery finds the new name.
    let response = client
        .put(format!("{}/users/profile", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "bio": "countess of code" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/users?search=ada", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["pagination"]["totalCount"], 1);
    assert_eq!(body["users"][0]["bio"], "countess of code");
}

#[tokio::test]
async fn test_account_deletion_cascades_and_invalidates_tokens() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (token_a, _) = register(&client, &app.address, "A", "a@x.com", "Aa1!aaaa").await;
    let (token_b, _) = register(&client, &app.address, "B", "b@x.com", "Bb2!bbbb").await;

    let response = client
        .post(format!("{}/posts", app.address))
        .bearer_auth(&token_a)
        .json(&serde_json::json!({ "content": "ephemeral" }))
        .send()
        .await
        .unwrap();
    let created: PostResponse = response.json().await.unwrap();

    let response = client
        .delete(format!("{}/users/profile", app.address))
        .bearer_auth(&token_a)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // The cascade removed the post.
    let response = client
        .get(format!("{}/posts/{}", app.address, created.post.id))
        .bearer_auth(&token_b)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // A's token still decodes, but the subject lookup turns it away.
    let response = client
        .post(format!("{}/auth/verify", app.address))
        .bearer_auth(&token_a)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "USER_NOT_FOUND");
}
