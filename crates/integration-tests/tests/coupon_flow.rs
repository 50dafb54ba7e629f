//! Integration tests for coupon validation.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - Demo coupons seeded (ml-cli seed coupons)
//! - The storefront server running (cargo run -p marigold-storefront)
//!
//! Run with: cargo test -p marigold-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use marigold_integration_tests::{session_client, storefront_base_url, unique_email};

/// Register a throwaway user so the session can call protected routes.
async fn signed_in_client() -> Client {
    let client = session_client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/api/auth/register"))
        .json(&json!({
            "email": unique_email(),
            "name": "Coupon Tester",
            "password": "correct-horse-battery",
        }))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    client
}

fn discount_of(body: &Value) -> f64 {
    match &body["discount"] {
        Value::String(s) => s.parse().expect("discount not numeric"),
        Value::Number(n) => n.as_f64().expect("discount not numeric"),
        other => panic!("unexpected discount value: {other}"),
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded coupons"]
async fn test_percentage_coupon_applies() {
    let client = signed_in_client().await;
    let base_url = storefront_base_url();

    // WELCOME10: 10% off, minimum 500, capped at 200
    let resp = client
        .post(format!("{base_url}/api/coupons/validate"))
        .json(&json!({
            "code": "WELCOME10",
            "cartAmount": 1000,
            "items": [
                { "productId": "prod_test", "price": 1000, "quantity": 1, "categories": [] }
            ],
        }))
        .send()
        .await
        .expect("validate request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("validate response not json");
    assert_eq!(body["valid"], true);
    assert_eq!(body["code"], "WELCOME10");
    let discount = discount_of(&body);
    assert!((discount - 100.0).abs() < 0.01, "expected 100, got {discount}");
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded coupons"]
async fn test_percentage_coupon_caps_at_maximum() {
    let client = signed_in_client().await;
    let base_url = storefront_base_url();

    // 10% of 5000 is 500, but WELCOME10 caps at 200
    let resp = client
        .post(format!("{base_url}/api/coupons/validate"))
        .json(&json!({
            "code": "WELCOME10",
            "cartAmount": 5000,
            "items": [
                { "productId": "prod_test", "price": 5000, "quantity": 1, "categories": [] }
            ],
        }))
        .send()
        .await
        .expect("validate request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("validate response not json");
    let discount = discount_of(&body);
    assert!((discount - 200.0).abs() < 0.01, "expected 200, got {discount}");
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded coupons"]
async fn test_coupon_below_minimum_rejected() {
    let client = signed_in_client().await;
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/api/coupons/validate"))
        .json(&json!({
            "code": "WELCOME10",
            "cartAmount": 100,
            "items": [
                { "productId": "prod_test", "price": 100, "quantity": 1, "categories": [] }
            ],
        }))
        .send()
        .await
        .expect("validate request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("error response not json");
    assert!(
        body["error"]
            .as_str()
            .expect("error not a string")
            .contains("Minimum order amount")
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_coupon_rejected() {
    let client = signed_in_client().await;
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/api/coupons/validate"))
        .json(&json!({
            "code": "NO-SUCH-CODE",
            "cartAmount": 1000,
            "items": [],
        }))
        .send()
        .await
        .expect("validate request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("error response not json");
    assert_eq!(body["error"], "Invalid coupon code");
}
