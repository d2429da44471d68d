//! Integration tests for the authentication flow.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The server running (cargo run -p coursehub-server)
//!
//! Run with: cargo test -p coursehub-integration-tests -- --ignored

use coursehub_integration_tests::{base_url, client, signup, unique};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn signup_then_me_round_trip() {
    let c = client();
    let suffix = unique();

    let user = signup(&c, &format!("student_{suffix}"), &format!("s{suffix}@test.example"), "student").await;
    assert_eq!(user["role"], "student");

    // The signup response set a session cookie; /me should agree.
    let me: Value = c
        .get(format!("{}/api/auth/me", base_url()))
        .send()
        .await
        .expect("me request failed")
        .json()
        .await
        .expect("me response not JSON");

    assert_eq!(me["id"], user["id"]);
    assert_eq!(me["username"], user["username"]);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn email_is_normalized_on_signup() {
    let c = client();
    let suffix = unique();

    let user = signup(
        &c,
        &format!("norm_{suffix}"),
        &format!("  Mixed.Case{suffix}@Test.Example  "),
        "student",
    )
    .await;

    let email = user["email"].as_str().expect("email present");
    assert_eq!(email, email.trim().to_lowercase());
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn duplicate_email_signup_conflicts() {
    let suffix = unique();
    let email = format!("dup{suffix}@test.example");

    signup(&client(), &format!("first_{suffix}"), &email, "student").await;

    let resp = client()
        .post(format!("{}/api/auth/signup", base_url()))
        .json(&json!({
            "username": format!("second_{suffix}"),
            "email": email,
            "password": "integration-test-pw",
        }))
        .send()
        .await
        .expect("signup request failed");

    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn admin_role_cannot_be_self_assigned() {
    let suffix = unique();

    let resp = client()
        .post(format!("{}/api/auth/signup", base_url()))
        .json(&json!({
            "username": format!("sneaky_{suffix}"),
            "email": format!("sneaky{suffix}@test.example"),
            "password": "integration-test-pw",
            "role": "admin",
        }))
        .send()
        .await
        .expect("signup request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn wrong_password_is_unauthorized() {
    let c = client();
    let suffix = unique();
    let email = format!("login{suffix}@test.example");

    signup(&c, &format!("login_{suffix}"), &email, "student").await;

    let resp = client()
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({"email": email, "password": "not-the-password"}))
        .send()
        .await
        .expect("login request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn logout_ends_the_session() {
    let c = client();
    let suffix = unique();

    signup(&c, &format!("out_{suffix}"), &format!("out{suffix}@test.example"), "student").await;

    let resp = c
        .post(format!("{}/api/auth/logout", base_url()))
        .send()
        .await
        .expect("logout request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = c
        .get(format!("{}/api/auth/me", base_url()))
        .send()
        .await
        .expect("me request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
