//! Integration test helpers for Coursehub.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! cargo run -p coursehub-cli -- migrate
//!
//! # Start the server
//! cargo run -p coursehub-server
//!
//! # Run the (ignored-by-default) integration tests
//! cargo test -p coursehub-integration-tests -- --ignored
//! ```
//!
//! Tests talk to a live server over HTTP with cookie-holding reqwest
//! clients, one per simulated user.

use reqwest::Client;
use serde_json::{Value, json};

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("COURSEHUB_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Webhook signing secret the server under test was started with.
#[must_use]
pub fn webhook_secret() -> String {
    std::env::var("GATEWAY_WEBHOOK_SECRET")
        .unwrap_or_else(|_| "whsec_integration_0c3fb19a74e2".to_string())
}

/// Connect straight to the database under test, for assertions about
/// state the HTTP surface doesn't expose (e.g. payment rows).
///
/// # Panics
///
/// Panics if no database URL is configured or the connection fails.
pub async fn db() -> sqlx::PgPool {
    let url = std::env::var("COURSEHUB_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("COURSEHUB_DATABASE_URL or DATABASE_URL must be set");

    sqlx::PgPool::connect(&url)
        .await
        .expect("failed to connect to the test database")
}

/// Create a cookie-holding client representing one browser session.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Sign up a fresh account and return its JSON representation.
///
/// The session cookie lands in the client's cookie store, so subsequent
/// requests from the same client are authenticated.
///
/// # Panics
///
/// Panics if the server rejects the signup.
pub async fn signup(client: &Client, username: &str, email: &str, role: &str) -> Value {
    let resp = client
        .post(format!("{}/api/auth/signup", base_url()))
        .json(&json!({
            "username": username,
            "email": email,
            "password": "integration-test-pw",
            "role": role,
        }))
        .send()
        .await
        .expect("signup request failed");

    assert_eq!(resp.status(), reqwest::StatusCode::CREATED, "signup rejected");
    resp.json().await.expect("signup response not JSON")
}

/// Create a course as the given (instructor) client and return it.
///
/// # Panics
///
/// Panics if the server rejects the request.
pub async fn create_course(client: &Client, title: &str, price: &str, published: bool) -> Value {
    let resp = client
        .post(format!("{}/api/courses", base_url()))
        .json(&json!({
            "title": title,
            "description": "Created by the integration suite",
            "category": "programming",
            "level": "beginner",
            "price": price,
            "published": published,
            "lessons": [
                {"title": "Introduction", "duration": 5, "free_preview": true},
                {"title": "Deep dive", "duration": 25},
            ],
        }))
        .send()
        .await
        .expect("course create request failed");

    assert_eq!(
        resp.status(),
        reqwest::StatusCode::CREATED,
        "course create rejected"
    );
    resp.json().await.expect("course response not JSON")
}

/// Log in as the seeded admin account and return the client.
///
/// The account is created out of band with
/// `cargo run -p coursehub-cli -- admin create`, and its credentials are
/// passed in through the environment.
///
/// # Panics
///
/// Panics if the login is rejected.
pub async fn admin_client() -> Client {
    let email = std::env::var("COURSEHUB_ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@test.example".to_string());
    let password = std::env::var("COURSEHUB_ADMIN_PASSWORD")
        .unwrap_or_else(|_| "integration-admin-pw".to_string());

    let admin = client();
    let resp = admin
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .expect("admin login request failed");

    assert_eq!(resp.status(), reqwest::StatusCode::OK, "admin login rejected");
    admin
}

/// Compute the webhook signature header for a payload.
#[must_use]
pub fn sign_webhook(secret: &str, payload: &[u8], timestamp: i64) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

/// A short unique suffix for usernames and emails.
#[must_use]
pub fn unique() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}
