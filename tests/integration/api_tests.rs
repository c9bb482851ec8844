//! API integration tests
//!
//! These run against a live server with a seeded database.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";

/// Helper to log in and get a token for the given account
async fn get_token(client: &Client, email: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn admin_token(client: &Client) -> String {
    get_token(client, "admin@library.com", "Admin123!").await
}

async fn user_token(client: &Client) -> String {
    get_token(client, "user@library.com", "User123!").await
}

/// Create a book with a unique ISBN and return its id
async fn create_book(client: &Client, token: &str, isbn: &str) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": format!("Test Book {}", isbn),
            "description": "A test book",
            "coverImage": "/covers/test.jpg",
            "author": "Test Author",
            "isbn": isbn,
            "publisher": "Test Press",
            "year": 2020,
            "category": "Technology",
            "location": "Shelf B2"
        }))
        .send()
        .await
        .expect("Failed to send create request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse create response");
    body["id"].as_i64().expect("No id in response")
}

fn unique_isbn(tag: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    format!("978-{}-{}", tag, nanos)
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
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@library.com",
            "password": "Admin123!"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["email"], "admin@library.com");
    assert_eq!(body["user"]["role"], "admin");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@library.com",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Invalid credentials.");
}

#[tokio::test]
#[ignore]
async fn test_login_disabled_account() {
    let client = Client::new();
    let token = admin_token(&client).await;

    // Create a fresh account, then disable it
    let email = format!("disabled-{}@library.com", unique_isbn("d"));
    let response = client
        .post(format!("{}/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "email": email,
            "password": "Disabled123!"
        }))
        .send()
        .await
        .expect("Failed to create user");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let id = body["id"].as_i64().expect("No id in response");

    let response = client
        .put(format!("{}/users/{}", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "isActive": false }))
        .send()
        .await
        .expect("Failed to disable user");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "Disabled123!"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Account is disabled.");
}

#[tokio::test]
#[ignore]
async fn test_disabled_account_token_gets_unauthorized() {
    let client = Client::new();
    let admin = admin_token(&client).await;

    // Create an account, log in, then disable it while its token is live
    let email = format!("revoked-{}@library.com", unique_isbn("r"));
    let response = client
        .post(format!("{}/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({
            "email": email,
            "password": "Revoked123!"
        }))
        .send()
        .await
        .expect("Failed to create user");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let id = body["id"].as_i64().expect("No id in response");

    let token = get_token(&client, &email, "Revoked123!").await;

    let response = client
        .put(format!("{}/users/{}", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "isActive": false }))
        .send()
        .await
        .expect("Failed to disable user");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/auth/profile", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send profile request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_profile_requires_token() {
    let client = Client::new();

    let response = client
        .get(format!("{}/auth/profile", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_create_book_requires_admin() {
    let client = Client::new();
    let token = user_token(&client).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "title": "Nope" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_create_book_reports_missing_fields() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "title": "Lonely Title" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    let errors = body["errors"].as_array().expect("No errors array");
    assert!(errors
        .iter()
        .any(|e| e["field"] == "author" && e["message"] == "Author is required."));
    assert!(errors.iter().all(|e| e["field"] != "title"));
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_rejected() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let isbn = unique_isbn("dup");

    create_book(&client, &token, &isbn).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Copycat",
            "description": "Same ISBN",
            "coverImage": "/covers/copy.jpg",
            "author": "Someone Else",
            "isbn": isbn,
            "publisher": "Other Press",
            "year": 2021,
            "category": "History",
            "location": "Shelf A3"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    let errors = body["errors"].as_array().expect("No errors array");
    assert!(errors
        .iter()
        .any(|e| e["field"] == "isbn" && e["message"] == "ISBN must be unique."));
}

#[tokio::test]
#[ignore]
async fn test_invalid_book_id_format() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books/not-a-number", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Invalid book ID format");
}

#[tokio::test]
#[ignore]
async fn test_get_book_increments_view_count() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let id = create_book(&client, &token, &unique_isbn("vc")).await;

    let first: Value = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let second: Value = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let a = first["viewCount"].as_i64().expect("No viewCount");
    let b = second["viewCount"].as_i64().expect("No viewCount");
    assert_eq!(b, a + 1);
}

#[tokio::test]
#[ignore]
async fn test_double_borrow_rejected() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let token = user_token(&client).await;
    let id = create_book(&client, &admin, &unique_isbn("bw")).await;

    let response = client
        .post(format!("{}/books/{}/borrow", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/books/{}/borrow", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send second borrow request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(
        body["message"],
        "You have already borrowed this book and not returned it yet."
    );
}

#[tokio::test]
#[ignore]
async fn test_return_without_borrow_rejected() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let token = user_token(&client).await;
    let id = create_book(&client, &admin, &unique_isbn("rt")).await;

    let response = client
        .post(format!("{}/books/{}/return", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(
        body["message"],
        "You do not have an active borrow for this book."
    );
}

#[tokio::test]
#[ignore]
async fn test_borrow_then_return_cycle() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let token = user_token(&client).await;
    let id = create_book(&client, &admin, &unique_isbn("cy")).await;

    let response = client
        .post(format!("{}/books/{}/borrow", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);

    let status: Value = client
        .get(format!("{}/books/{}/borrow-status", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send status request")
        .json()
        .await
        .expect("Failed to parse status response");
    assert_eq!(status["isBorrowed"], true);

    let response = client
        .post(format!("{}/books/{}/return", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "comments": "Great read" }))
        .send()
        .await
        .expect("Failed to send return request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "returned");
    assert_eq!(body["comments"], "Great read");
    assert!(body["returnDate"].is_string());

    let status: Value = client
        .get(format!("{}/books/{}/borrow-status", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send status request")
        .json()
        .await
        .expect("Failed to parse status response");
    assert_eq!(status["isBorrowed"], false);
    assert!(status["lastRecord"].is_object());
}

#[tokio::test]
#[ignore]
async fn test_book_list_pagination_envelope() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books?page=1&limit=2", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"].is_array());
    let total = body["total"].as_i64().expect("No total");
    let total_pages = body["totalPages"].as_i64().expect("No totalPages");
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 2);
    assert_eq!(total_pages, (total + 1) / 2);
}

#[tokio::test]
#[ignore]
async fn test_users_endpoint_requires_admin() {
    let client = Client::new();
    let token = user_token(&client).await;

    let response = client
        .get(format!("{}/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Forbidden");
}

#[tokio::test]
#[ignore]
async fn test_duplicate_email_conflict_on_create() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .post(format!("{}/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "email": "user@library.com",
            "password": "Another123!"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Email is already registered.");
}
