//! API integration tests
//!
//! Each test serves the production router on an ephemeral port, backed by
//! the in-memory repository, and talks to it over HTTP.

use book_catalog_server::{
    api,
    config::{AppConfig, StorageBackend},
    repository::Repository,
    AppState,
};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    client: Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let mut config = AppConfig::default();
        config.database.backend = StorageBackend::Memory;
        config.auth.jwt_secret = "integration-secret".to_string();

        let app = api::create_router(AppState::new(config, Repository::in_memory()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            client: Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register an account and return (id, token)
    async fn register(&self, username: &str, role: &str) -> (i64, String) {
        let response = self
            .client
            .post(self.url(&format!("/users?role={}", role)))
            .json(&json!({ "username": username, "password": "secret123" }))
            .send()
            .await
            .expect("Failed to send register request");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: Value = response.json().await.unwrap();
        (
            body["id"].as_i64().expect("No id in response"),
            body["token"].as_str().expect("No token in response").to_string(),
        )
    }

    async fn create_author(&self, token: &str, first: &str, last: &str, year: i32) -> Value {
        let response = self
            .client
            .post(self.url("/authors"))
            .bearer_auth(token)
            .json(&json!({
                "firstName": first,
                "lastName": last,
                "birthYear": year,
                "country": "USA"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.unwrap()
    }

    async fn create_book(&self, token: &str, title: &str, year: i32, genre: &str, author_id: &str) -> reqwest::Response {
        self.client
            .post(self.url("/books"))
            .bearer_auth(token)
            .json(&json!({
                "title": title,
                "releaseYear": year,
                "genre": genre,
                "authorId": author_id
            }))
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn test_health_check() {
    let srv = TestServer::spawn().await;

    let response = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    let response = srv.client.get(srv.url("/ready")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_author_returns_location_and_id() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.register("reader01", "USER").await;

    let response = srv
        .client
        .post(srv.url("/authors"))
        .bearer_auth(&token)
        .json(&json!({
            "firstName": "Cormac",
            "lastName": "McCarthy",
            "birthYear": 1933,
            "country": "USA"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("Location header");

    let body: Value = response.json().await.unwrap();
    let id = body["id"].as_str().expect("generated id");
    assert_eq!(location, format!("/api/authors/{}", id));
    assert_eq!(body["firstName"], "Cormac");
    assert_eq!(body["lastName"], "McCarthy");
    assert_eq!(body["birthYear"], 1933);

    let fetched: Value = srv
        .client
        .get(srv.url(&format!("/authors/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn test_writes_require_a_token() {
    let srv = TestServer::spawn().await;

    let response = srv
        .client
        .post(srv.url("/authors"))
        .json(&json!({
            "firstName": "Cormac",
            "lastName": "McCarthy",
            "birthYear": 1933,
            "country": "USA"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errorCode"], "UNAUTHORIZED");
    assert_eq!(body["statusCode"], 401);

    let response = srv
        .client
        .get(srv.url("/users/1"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_author_conflicts() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.register("reader01", "USER").await;
    srv.create_author(&token, "Cormac", "McCarthy", 1933).await;

    let response = srv
        .client
        .post(srv.url("/authors"))
        .bearer_auth(&token)
        .json(&json!({
            "firstName": "Cormac",
            "lastName": "McCarthy",
            "birthYear": 1933,
            "country": "USA"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errorCode"], "CONFLICT");
}

#[tokio::test]
async fn test_invalid_author_reports_every_field() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.register("reader01", "USER").await;

    let response = srv
        .client
        .post(srv.url("/authors"))
        .bearer_auth(&token)
        .json(&json!({
            "firstName": "",
            "lastName": "",
            "birthYear": 3000,
            "country": "USA"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    let fields: Vec<&str> = body
        .as_array()
        .expect("list of field errors")
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["birthYear", "firstName", "lastName"]);
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .all(|e| e["errorCode"] == "VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_books_filtered_by_genre() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.register("reader01", "USER").await;
    let frank = srv.create_author(&token, "Frank", "Herbert", 1920).await;
    let frank_id = frank["id"].as_str().unwrap();

    for (title, year, genre) in [
        ("Dune Messiah", 1969, "SCI_FI"),
        ("Dune", 1965, "SCI_FI"),
        ("Soul Catcher", 1972, "DRAMA"),
    ] {
        let response = srv.create_book(&token, title, year, genre, frank_id).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let body: Value = srv
        .client
        .get(srv.url("/books?genre=SCI_FI"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["totalElements"], 2);
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["page"], 0);
    assert_eq!(body["size"], 10);
    assert_eq!(body["isFirst"], true);
    assert_eq!(body["last"], true);
    let titles: Vec<&str> = body["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Dune", "Dune Messiah"]);
    assert_eq!(body["content"][0]["author"]["lastName"], "Herbert");
}

#[tokio::test]
async fn test_book_listing_paging_and_bad_sort() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.register("reader01", "USER").await;
    let frank = srv.create_author(&token, "Frank", "Herbert", 1920).await;
    let frank_id = frank["id"].as_str().unwrap();
    for (title, year) in [("Dune", 1965), ("Dune Messiah", 1969), ("Children of Dune", 1976)] {
        srv.create_book(&token, title, year, "SCI_FI", frank_id).await;
    }

    let body: Value = srv
        .client
        .get(srv.url("/books?page=1&size=2&sort=releaseYear,desc"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["last"], true);
    assert_eq!(body["content"].as_array().unwrap().len(), 1);
    assert_eq!(body["content"][0]["title"], "Dune");

    let response = srv
        .client
        .get(srv.url("/books?sort=password"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_far_out_page_index_returns_empty_last_page() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.register("reader01", "USER").await;
    let frank = srv.create_author(&token, "Frank", "Herbert", 1920).await;
    srv.create_book(&token, "Dune", 1965, "SCI_FI", frank["id"].as_str().unwrap())
        .await;

    for path in ["/books?page=9223372036854775807", "/authors?page=9223372036854775807&size=100"] {
        let response = srv.client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", path);

        let body: Value = response.json().await.unwrap();
        assert!(body["content"].as_array().unwrap().is_empty(), "{}", path);
        assert_eq!(body["totalElements"], 1);
        assert_eq!(body["last"], true);
    }
}

#[tokio::test]
async fn test_book_with_unknown_author_is_not_found() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.register("reader01", "USER").await;

    let response = srv
        .create_book(&token, "Dune", 1965, "SCI_FI", "00000000-0000-4000-8000-000000000000")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errorCode"], "AUTHOR_NOT_FOUND");
}

#[tokio::test]
async fn test_catalog_updates_and_deletes_require_admin() {
    let srv = TestServer::spawn().await;
    let (_, user_token) = srv.register("reader01", "USER").await;
    let (_, admin_token) = srv.register("admin001", "ADMIN").await;
    let author = srv.create_author(&user_token, "Cormac", "McCarthy", 1933).await;
    let id = author["id"].as_str().unwrap();

    let response = srv
        .client
        .delete(srv.url(&format!("/authors/{}", id)))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = srv
        .client
        .put(srv.url(&format!("/authors/{}", id)))
        .bearer_auth(&admin_token)
        .json(&json!({
            "firstName": "Cormac",
            "lastName": "McCarthy",
            "birthYear": 1933,
            "country": "United States"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["country"], "United States");

    let response = srv
        .client
        .delete(srv.url(&format!("/authors/{}", id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = srv
        .client
        .get(srv.url(&format!("/authors/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errorCode"], "AUTHOR_NOT_FOUND");
}

#[tokio::test]
async fn test_register_rejects_short_username() {
    let srv = TestServer::spawn().await;

    let response = srv
        .client
        .post(srv.url("/users"))
        .json(&json!({ "username": "ab", "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    let errors = body.as_array().expect("list of field errors");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["field"], "username");
}

#[tokio::test]
async fn test_login() {
    let srv = TestServer::spawn().await;
    srv.register("reader01", "USER").await;

    let response = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "username": "reader01", "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["token"].is_string());

    let response = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "username": "reader01", "password": "wrong-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forbidden_before_not_found() {
    let srv = TestServer::spawn().await;
    let (id, token) = srv.register("reader01", "USER").await;
    let (_, admin_token) = srv.register("admin001", "ADMIN").await;

    // Another user's id that does not exist: still forbidden
    let response = srv
        .client
        .get(srv.url(&format!("/users/{}", id + 1000)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = srv
        .client
        .get(srv.url(&format!("/users/{}", id + 1000)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = srv
        .client
        .get(srv.url("/users"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body: Value = srv
        .client
        .get(srv.url("/users"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalElements"], 2);
    assert!(body["content"][0].get("password").is_none());
}

#[tokio::test]
async fn test_user_self_service_lifecycle() {
    let srv = TestServer::spawn().await;
    let (id, token) = srv.register("reader01", "USER").await;

    let body: Value = srv
        .client
        .get(srv.url(&format!("/users/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "id": id, "username": "reader01" }));

    let response = srv
        .client
        .put(srv.url(&format!("/users/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "password": "newpass1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "username": "reader01", "password": "newpass1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = srv
        .client
        .delete(srv.url(&format!("/users/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The token outlives the account but no longer authenticates
    let response = srv
        .client
        .delete(srv.url(&format!("/users/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
