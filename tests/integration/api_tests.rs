//! API integration tests
//!
//! These run against a live server with a migrated database:
//! `cargo test -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Suffix making emails and titles unique across runs
fn unique(prefix: &str) -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{}-{}", prefix, nanos)
}

/// Register a fresh user and return (email, password)
async fn register(client: &Client) -> (String, String) {
    let email = format!("{}@example.org", unique("reader"));
    let password = "correct horse battery".to_string();

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": "Integration Reader",
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::CREATED);

    (email, password)
}

/// Helper to get an authenticated client token
async fn get_auth_token(client: &Client) -> String {
    let (email, password) = register(client).await;

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn create_author(client: &Client, token: &str, name: &str) -> i64 {
    let response = client
        .post(format!("{}/authors", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "name": name, "about": "Wrote things" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No author id")
}

async fn create_book(client: &Client, token: &str, title: &str, author_id: i64) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "title": title,
            "category": "Fiction",
            "publisher": "Chilton",
            "book_count": 3,
            "price": 12.5,
            "fine_per_day": 0.25,
            "author_id": author_id
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

async fn get_book(client: &Client, token: &str, id: i64) -> Value {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    response.json().await.expect("Failed to parse response")
}

/// Titles of the books whose title contains `fragment`, in response order
async fn search_titles(client: &Client, token: &str, fragment: &str) -> Vec<String> {
    let response = client
        .get(format!("{}/books", BASE_URL))
        .query(&[("title", fragment)])
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    body.as_array()
        .expect("Expected an array")
        .iter()
        .map(|book| book["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_register_and_login() {
    let client = Client::new();
    let (email, password) = register(&client).await;

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["email"], email);
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_duplicate_registration_conflicts() {
    let client = Client::new();
    let (email, password) = register(&client).await;

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": "Someone Else",
            "email": email.to_uppercase(),
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (email, _) = register(&client).await;

    let wrong_password = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "wrong password" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password: Value = wrong_password.json().await.unwrap();

    let unknown_email = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": "nobody@example.org", "password": "wrong password" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let unknown_email: Value = unknown_email.json().await.unwrap();

    assert_eq!(wrong_password["message"], unknown_email["message"]);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(format!("{}/books", BASE_URL))
        .bearer_auth("garbage")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_author_lookup() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let name = unique("Ursula");
    let id = create_author(&client, &token, &name).await;

    let response = client
        .get(format!("{}/authors/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["name"], name);

    let response = client
        .get(format!("{}/authors", BASE_URL))
        .query(&[("name", name.to_lowercase())])
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let response = client
        .get(format!("{}/authors/{}", BASE_URL, i32::MAX))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_create_book_with_missing_references() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let orphan = unique("Orphan");
    let misfiled = unique("Misfiled");

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": orphan,
            "category": "Fiction",
            "publisher": "Nobody",
            "author_id": i32::MAX
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let author_id = create_author(&client, &token, &unique("Author")).await;
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": misfiled,
            "category": "No Such Category",
            "publisher": "Nobody",
            "author_id": author_id
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Neither rejected insert left a row behind
    assert!(search_titles(&client, &token, &orphan).await.is_empty());
    assert!(search_titles(&client, &token, &misfiled).await.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_partial_update_touches_only_given_fields() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let author_id = create_author(&client, &token, &unique("Author")).await;
    let book = create_book(&client, &token, &unique("Dune"), author_id).await;
    let id = book["id"].as_i64().unwrap();

    let response = client
        .put(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({ "book_count": 7, "price": 15 }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["book_count"], 7);
    assert_eq!(updated["price"], "15.00");
    assert_eq!(updated["title"], book["title"]);
    assert_eq!(updated["category"], book["category"]);
    assert_eq!(updated["publisher"], book["publisher"]);
    assert_eq!(updated["fine_per_day"], book["fine_per_day"]);
    assert_eq!(updated["author_id"], book["author_id"]);
    assert_eq!(updated["created_at"], book["created_at"]);
    assert_ne!(updated["updated_at"], book["updated_at"]);

    // A fresh read sees the same row
    let stored = get_book(&client, &token, id).await;
    assert_eq!(stored, updated);

    let response = client
        .put(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .put(format!("{}/books/{}", BASE_URL, i32::MAX))
        .bearer_auth(&token)
        .json(&json!({ "title": "Ghost" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_update_with_missing_references_changes_nothing() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let author_id = create_author(&client, &token, &unique("Author")).await;
    let book = create_book(&client, &token, &unique("Dune"), author_id).await;
    let id = book["id"].as_i64().unwrap();

    let response = client
        .put(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({ "title": "Renamed", "category": "No Such Category" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .put(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({ "book_count": 9, "author_id": i32::MAX }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Title, count and updated_at are exactly as created
    let stored = get_book(&client, &token, id).await;
    assert_eq!(stored, book);
}

#[tokio::test]
#[ignore]
async fn test_search_returns_newest_first() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let author_id = create_author(&client, &token, &unique("Author")).await;
    let series = unique("Saga");
    let first = format!("{} volume one", series);
    let second = format!("{} volume two", series);

    create_book(&client, &token, &first, author_id).await;
    create_book(&client, &token, &second, author_id).await;

    assert_eq!(search_titles(&client, &token, &series).await, vec![second, first]);
}

#[tokio::test]
#[ignore]
async fn test_search_books() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let author_name = unique("Herbert");
    let author_id = create_author(&client, &token, &author_name).await;
    let title = unique("Children of Dune");
    create_book(&client, &token, &title, author_id).await;

    let response = client
        .get(format!("{}/books", BASE_URL))
        .query(&[
            ("title", title.to_uppercase()),
            ("author_name", author_name.clone()),
        ])
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    let books = body.as_array().expect("Expected an array");
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["author_name"], author_name);

    let response = client
        .get(format!("{}/books", BASE_URL))
        .query(&[("title", title.as_str()), ("publisher", "nobody prints this")])
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body.as_array().map(Vec::len), Some(0));
}
