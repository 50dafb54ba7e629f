//! Integration tests for session authentication.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The storefront server running (cargo run -p marigold-storefront)
//!
//! Run with: cargo test -p marigold-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};

use marigold_integration_tests::{session_client, storefront_base_url, unique_email};

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_login_logout_cycle() {
    let client = session_client();
    let base_url = storefront_base_url();
    let email = unique_email();

    // Register signs the new user in
    let resp = client
        .post(format!("{base_url}/api/auth/register"))
        .json(&json!({
            "email": email,
            "name": "Test Shopper",
            "password": "correct-horse-battery",
        }))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("register response not json");
    assert_eq!(body["email"], email.as_str());

    // Session cookie identifies us
    let resp = client
        .get(format!("{base_url}/api/auth/me"))
        .send()
        .await
        .expect("me request failed");
    let body: Value = resp.json().await.expect("me response not json");
    assert_eq!(body["user"]["email"], email.as_str());

    // Logout clears the session
    let resp = client
        .post(format!("{base_url}/api/auth/logout"))
        .send()
        .await
        .expect("logout request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/api/auth/me"))
        .send()
        .await
        .expect("me request failed");
    let body: Value = resp.json().await.expect("me response not json");
    assert!(body["user"].is_null());

    // And login works again with the same credentials
    let resp = client
        .post(format!("{base_url}/api/auth/login"))
        .json(&json!({
            "email": email,
            "password": "correct-horse-battery",
        }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_login_rejects_wrong_password() {
    let client = session_client();
    let base_url = storefront_base_url();
    let email = unique_email();

    let resp = client
        .post(format!("{base_url}/api/auth/register"))
        .json(&json!({
            "email": email,
            "name": "Test Shopper",
            "password": "correct-horse-battery",
        }))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base_url}/api/auth/login"))
        .json(&json!({
            "email": email,
            "password": "not-the-password",
        }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_rejects_duplicate_email() {
    let client = session_client();
    let base_url = storefront_base_url();
    let email = unique_email();

    let payload = json!({
        "email": email,
        "name": "Test Shopper",
        "password": "correct-horse-battery",
    });

    let resp = client
        .post(format!("{base_url}/api/auth/register"))
        .json(&payload)
        .send()
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base_url}/api/auth/register"))
        .json(&payload)
        .send()
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_protected_routes_require_session() {
    let client = session_client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/api/orders"))
        .send()
        .await
        .expect("orders request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .get(format!("{base_url}/api/cart"))
        .send()
        .await
        .expect("cart request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
