//! Integration tests for checkout and webhook reconciliation.
//!
//! The webhook tests post gateway-shaped events signed with the same
//! secret the server was started with, so no real gateway is needed.
//!
//! Run with: cargo test -p coursehub-integration-tests -- --ignored

use std::time::{SystemTime, UNIX_EPOCH};

use coursehub_integration_tests::{
    base_url, client, create_course, db, sign_webhook, signup, unique, webhook_secret,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs()
        .try_into()
        .expect("timestamp fits i64")
}

fn completed_event(session_id: &str, course_id: &Value, user_id: &Value, email: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": format!("evt_{session_id}"),
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "status": "complete",
                "amount_total": 4999,
                "currency": "usd",
                "payment_intent": format!("pi_{session_id}"),
                "customer_email": email,
                "metadata": {
                    "course_id": course_id.to_string(),
                    "user_id": user_id.to_string(),
                    "user_email": email,
                },
            },
        },
    }))
    .expect("event serializes")
}

async fn post_webhook(payload: &[u8], signature: &str) -> reqwest::Response {
    client()
        .post(format!("{}/api/payments/webhook", base_url()))
        .header("gateway-signature", signature)
        .header("content-type", "application/json")
        .body(payload.to_vec())
        .send()
        .await
        .expect("webhook request failed")
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn free_course_checkout_enrolls_without_gateway() {
    let suffix = unique();

    let instructor = client();
    signup(&instructor, &format!("winst_{suffix}"), &format!("wi{suffix}@test.example"), "instructor").await;
    let course = create_course(&instructor, "Free via Checkout", "0", true).await;

    let student = client();
    signup(&student, &format!("wstud_{suffix}"), &format!("ws{suffix}@test.example"), "student").await;

    let resp: Value = student
        .post(format!("{}/api/payments/create-checkout", base_url()))
        .json(&json!({"course_id": course["id"]}))
        .send()
        .await
        .expect("checkout request failed")
        .json()
        .await
        .expect("checkout response not JSON");

    assert_eq!(resp["is_free"], true);
    let redirect = resp["checkout_url"].as_str().expect("free checkout redirect");
    assert!(redirect.ends_with("?enrolled=true"));

    let check: Value = student
        .get(format!("{}/api/enrollments/check", base_url()))
        .query(&[("course_id", course["id"].to_string())])
        .send()
        .await
        .expect("check request failed")
        .json()
        .await
        .expect("check response not JSON");
    assert_eq!(check["enrolled"], true);

    // A second checkout attempt for the same course is a client error.
    let resp = student
        .post(format!("{}/api/payments/create-checkout", base_url()))
        .json(&json!({"course_id": course["id"]}))
        .send()
        .await
        .expect("checkout request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn signed_webhook_creates_the_enrollment() {
    let suffix = unique();

    let instructor = client();
    signup(&instructor, &format!("hinst_{suffix}"), &format!("hi{suffix}@test.example"), "instructor").await;
    let course = create_course(&instructor, "Webhook Course", "49.99", true).await;

    let student = client();
    let email = format!("hs{suffix}@test.example");
    let user = signup(&student, &format!("hstud_{suffix}"), &email, "student").await;

    let session_id = format!("cs_test_{suffix}");
    let payload = completed_event(&session_id, &course["id"], &user["id"], &email);
    let signature = sign_webhook(&webhook_secret(), &payload, now());

    let resp = post_webhook(&payload, &signature).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let check: Value = student
        .get(format!("{}/api/enrollments/check", base_url()))
        .query(&[("course_id", course["id"].to_string())])
        .send()
        .await
        .expect("check request failed")
        .json()
        .await
        .expect("check response not JSON");
    assert_eq!(check["enrolled"], true);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn redelivered_webhook_is_idempotent() {
    let suffix = unique();

    let instructor = client();
    signup(&instructor, &format!("rinst_{suffix}"), &format!("ri{suffix}@test.example"), "instructor").await;
    let course = create_course(&instructor, "Redelivery Course", "19.99", true).await;

    let student = client();
    let email = format!("rs{suffix}@test.example");
    let user = signup(&student, &format!("rstud_{suffix}"), &email, "student").await;

    let session_id = format!("cs_test_r{suffix}");
    let payload = completed_event(&session_id, &course["id"], &user["id"], &email);

    // Deliver the same event twice, as a retrying gateway would.
    for _ in 0..2 {
        let signature = sign_webhook(&webhook_secret(), &payload, now());
        let resp = post_webhook(&payload, &signature).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let my_courses: Value = student
        .get(format!("{}/api/enrollments/my-courses", base_url()))
        .send()
        .await
        .expect("my-courses request failed")
        .json()
        .await
        .expect("my-courses response not JSON");

    let matching = my_courses
        .as_array()
        .expect("my-courses array")
        .iter()
        .filter(|e| e["course"]["id"] == course["id"])
        .count();
    assert_eq!(matching, 1, "redelivery must not duplicate the enrollment");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn late_expiry_does_not_unwind_a_succeeded_payment() {
    let suffix = unique();

    let instructor = client();
    signup(&instructor, &format!("oinst_{suffix}"), &format!("oi{suffix}@test.example"), "instructor").await;
    let course = create_course(&instructor, "Out of Order Course", "29.99", true).await;

    let student = client();
    let email = format!("os{suffix}@test.example");
    let user = signup(&student, &format!("ostud_{suffix}"), &email, "student").await;

    let session_id = format!("cs_test_o{suffix}");
    let completed = completed_event(&session_id, &course["id"], &user["id"], &email);
    let signature = sign_webhook(&webhook_secret(), &completed, now());
    assert_eq!(post_webhook(&completed, &signature).await.status(), StatusCode::OK);

    // A stale expiry for the same session arrives afterwards.
    let expired = serde_json::to_vec(&json!({
        "id": format!("evt_exp_{session_id}"),
        "type": "checkout.session.expired",
        "data": {
            "object": {
                "id": session_id,
                "status": "expired",
                "amount_total": 2999,
                "currency": "usd",
                "payment_intent": null,
                "customer_email": email,
                "metadata": {
                    "course_id": course["id"].to_string(),
                    "user_id": user["id"].to_string(),
                    "user_email": email,
                },
            },
        },
    }))
    .expect("event serializes");
    let signature = sign_webhook(&webhook_secret(), &expired, now());
    assert_eq!(post_webhook(&expired, &signature).await.status(), StatusCode::OK);

    // The sale stays recorded and the enrollment stays in place.
    let status: String = sqlx::query_scalar(
        "SELECT status::text FROM coursehub.payments WHERE session_id = $1",
    )
    .bind(&session_id)
    .fetch_one(&db().await)
    .await
    .expect("payment row missing");
    assert_eq!(status, "succeeded");

    let check: Value = student
        .get(format!("{}/api/enrollments/check", base_url()))
        .query(&[("course_id", course["id"].to_string())])
        .send()
        .await
        .expect("check request failed")
        .json()
        .await
        .expect("check response not JSON");
    assert_eq!(check["enrolled"], true);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn webhook_for_a_vanished_course_is_acknowledged() {
    let suffix = unique();

    let student = client();
    let email = format!("vs{suffix}@test.example");
    let user = signup(&student, &format!("vstud_{suffix}"), &email, "student").await;

    // Well-formed metadata pointing at a course id that doesn't exist.
    let payload = completed_event(
        &format!("cs_test_v{suffix}"),
        &json!(987_654_321),
        &user["id"],
        &email,
    );
    let signature = sign_webhook(&webhook_secret(), &payload, now());

    let resp = post_webhook(&payload, &signature).await;
    assert_eq!(resp.status(), StatusCode::OK, "redelivery cannot fix a missing course");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn tampered_webhook_is_rejected() {
    let suffix = unique();
    let payload = completed_event(
        &format!("cs_test_t{suffix}"),
        &json!(1),
        &json!(1),
        "t@test.example",
    );

    // Signature computed over different bytes.
    let signature = sign_webhook(&webhook_secret(), b"{}", now());
    let resp = post_webhook(&payload, &signature).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Stale timestamp.
    let signature = sign_webhook(&webhook_secret(), &payload, now() - 3600);
    let resp = post_webhook(&payload, &signature).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Missing header entirely.
    let resp = client()
        .post(format!("{}/api/payments/webhook", base_url()))
        .header("content-type", "application/json")
        .body(payload)
        .send()
        .await
        .expect("webhook request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
