//! API integration tests against a running server
//!
//! Start the server with `RUN_MODE=development` so the bootstrap admin exists.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an authenticated client
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Distinct per run so tests can be repeated against the same database
fn unique_suffix() -> i64 {
    chrono::Utc::now().timestamp_micros() % 1_000_000_000
}

/// Create a book and a member, returning (copy_id, member_id)
async fn seed_book_and_member(client: &Client, token: &str) -> (i64, i64) {
    let suffix = unique_suffix();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "isbn": format!("978{}", suffix),
            "title": "Integration Test Book"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let book: Value = response.json().await.expect("Failed to parse response");

    let member_id = suffix % 1_000_000 + 1;
    let response = client
        .post(format!("{}/members", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "member_id": member_id,
            "name": "Test Member",
            "email": format!("member{}@example.org", suffix),
            "phone": "555-0100",
            "address": "1 Library Lane"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    (book["copy_id"].as_i64().expect("No copy_id"), member_id)
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
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["role"], "Admin");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_borrow_requires_token() {
    let client = Client::new();

    let response = client
        .post(format!("{}/borrow", BASE_URL))
        .json(&json!({ "copy_id": 1, "member_id": 1 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_cycle() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let (copy_id, member_id) = seed_book_and_member(&client, &token).await;

    let response = client
        .post(format!("{}/borrow", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "copy_id": copy_id, "member_id": member_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], true);
    assert_eq!(body["borrow"]["copy_id"], copy_id);

    // Second borrow of the same copy
    let response = client
        .post(format!("{}/borrow", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "copy_id": copy_id, "member_id": member_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "CopyUnavailable");

    let response = client
        .get(format!("{}/copies/{}/status", BASE_URL, copy_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "Borrowed");
    assert_eq!(body["borrow_info"]["member_id"], member_id);

    let response = client
        .post(format!("{}/return", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "copy_id": copy_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["return"]["fine_id"].is_null());

    let response = client
        .post(format!("{}/return", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "copy_id": copy_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "AlreadyReturned");
}

#[tokio::test]
#[ignore]
async fn test_backdated_due_date_is_rejected() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let (copy_id, member_id) = seed_book_and_member(&client, &token).await;

    let response = client
        .post(format!("{}/borrow", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "copy_id": copy_id, "member_id": member_id, "due_date": "2000-01-01" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_remove_copy_twice() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let (copy_id, _member_id) = seed_book_and_member(&client, &token).await;

    let response = client
        .post(format!("{}/copies/{}/remove", BASE_URL, copy_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .post(format!("{}/copies/{}/remove", BASE_URL, copy_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "AlreadyLost");
}

#[tokio::test]
#[ignore]
async fn test_add_copies_limits() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/copies", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "isbn": "9780000000000", "quantity": 101 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_member_without_fines() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let (_copy_id, member_id) = seed_book_and_member(&client, &token).await;

    let response = client
        .get(format!("{}/payments?member_id={}", BASE_URL, member_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["unpaid_fines"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
#[ignore]
async fn test_get_stats() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["active_borrows"].is_number());
    assert!(body["unpaid_amount"].is_string());
    assert!(body["top_titles"].is_array());
    assert!(body["top_fined_members"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_borrowed_title_shows_in_top_titles() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let (copy_id, member_id) = seed_book_and_member(&client, &token).await;

    let response = client
        .post(format!("{}/borrow", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "copy_id": copy_id, "member_id": member_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = client
        .get(format!("{}/stats", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let titles = body["top_titles"].as_array().expect("No top_titles");
    assert!(titles.len() <= 10);
    assert!(titles.iter().all(|t| t["borrow_count"].as_i64().unwrap_or(0) >= 1));
}

#[tokio::test]
#[ignore]
async fn test_search_books() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let suffix = unique_suffix();
    let isbn = format!("979{}", suffix);

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "isbn": isbn, "title": format!("Searchable Atlas {}", suffix) }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .get(format!("{}/books/search", BASE_URL))
        .query(&[("q", format!("atlas {}", suffix))])
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["isbn"], isbn);
    assert_eq!(body["results"][0]["total_copies"], 1);
    assert_eq!(body["results"][0]["available_copies"], 1);

    let response = client
        .get(format!("{}/books/search", BASE_URL))
        .query(&[("q", isbn.as_str())])
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["count"], 1);

    // Wildcards are matched literally
    let response = client
        .get(format!("{}/books/search", BASE_URL))
        .query(&[("q", "%%")])
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["count"], 0);
}

#[tokio::test]
#[ignore]
async fn test_search_query_too_short() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/books/search?q=a", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_librarian_management() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let username = format!("librarian{}", unique_suffix());

    let response = client
        .post(format!("{}/librarians", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "username": username,
            "email": format!("{}@example.org", username),
            "password": "shelf-reader-42"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.expect("Failed to parse response");
    let user_id = created["user_id"].as_i64().expect("No user_id");
    assert_eq!(created["role"], "Librarian");
    assert!(created.get("password_hash").is_none());

    // Same username again
    let response = client
        .post(format!("{}/librarians", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "username": username,
            "email": format!("other-{}@example.org", username),
            "password": "shelf-reader-42"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // A librarian cannot manage accounts
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": username, "password": "shelf-reader-42" }))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let librarian_token = body["token"].as_str().expect("No token").to_string();
    let response = client
        .get(format!("{}/librarians", BASE_URL))
        .bearer_auth(&librarian_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .put(format!("{}/librarians/{}", BASE_URL, user_id))
        .bearer_auth(&token)
        .json(&json!({ "phone": "555-0199" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(updated["phone"], "555-0199");
    assert_eq!(updated["username"], username.as_str());

    let response = client
        .get(format!("{}/librarians", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let list: Value = response.json().await.expect("Failed to parse response");
    assert!(list
        .as_array()
        .expect("Expected a list")
        .iter()
        .any(|l| l["user_id"].as_i64() == Some(user_id)));

    let response = client
        .delete(format!("{}/librarians/{}", BASE_URL, user_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .delete(format!("{}/librarians/{}", BASE_URL, user_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
