//! Integration tests for the admin panel.
//!
//! These need an admin account created out of band:
//!
//! ```bash
//! cargo run -p coursehub-cli -- admin create \
//!     --username admin --email admin@test.example --password integration-admin-pw
//! ```
//!
//! Run with: cargo test -p coursehub-integration-tests -- --ignored

use std::time::{SystemTime, UNIX_EPOCH};

use coursehub_integration_tests::{
    admin_client, base_url, client, create_course, sign_webhook, signup, unique, webhook_secret,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running server, database, and seeded admin account"]
async fn admin_endpoints_reject_non_admins() {
    let suffix = unique();

    let student = client();
    signup(&student, &format!("astud_{suffix}"), &format!("as{suffix}@test.example"), "student").await;

    for path in ["/api/admin/users", "/api/admin/courses", "/api/admin/stats"] {
        let resp = student
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .expect("admin request failed");
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{path} should be admin-only");
    }

    // Unauthenticated requests fail before the role check.
    let resp = client()
        .get(format!("{}/api/admin/stats", base_url()))
        .send()
        .await
        .expect("admin request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server, database, and seeded admin account"]
async fn admin_can_change_roles_but_not_their_own() {
    let suffix = unique();
    let admin = admin_client().await;

    let student = client();
    let user = signup(&student, &format!("promote_{suffix}"), &format!("pr{suffix}@test.example"), "student").await;

    let resp = admin
        .put(format!("{}/api/admin/users/{}", base_url(), user["id"]))
        .json(&json!({"role": "instructor"}))
        .send()
        .await
        .expect("role update failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("update response not JSON");
    assert_eq!(updated["role"], "instructor");

    // The promoted account can now author courses.
    let resp = student
        .post(format!("{}/api/courses", base_url()))
        .json(&json!({
            "title": "Post-promotion course",
            "description": "Written right after the role change",
            "category": "programming",
            "level": "beginner",
            "price": "0",
            "lessons": [{"title": "Only lesson", "duration": 3}],
        }))
        .send()
        .await
        .expect("course create failed");
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Self role change is refused.
    let me: Value = admin
        .get(format!("{}/api/auth/me", base_url()))
        .send()
        .await
        .expect("me request failed")
        .json()
        .await
        .expect("me response not JSON");
    let resp = admin
        .put(format!("{}/api/admin/users/{}", base_url(), me["id"]))
        .json(&json!({"role": "student"}))
        .send()
        .await
        .expect("self role update failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server, database, and seeded admin account"]
async fn admin_moderates_publication_and_sees_drafts() {
    let suffix = unique();
    let admin = admin_client().await;

    let instructor = client();
    signup(&instructor, &format!("minst_{suffix}"), &format!("mi{suffix}@test.example"), "instructor").await;
    let course = create_course(&instructor, &format!("Draft {suffix}"), "9.99", false).await;

    // Drafts are invisible in the public catalog but listed for admins.
    let public: Value = client()
        .get(format!("{}/api/courses", base_url()))
        .send()
        .await
        .expect("catalog request failed")
        .json()
        .await
        .expect("catalog response not JSON");
    assert!(
        !public.as_array().expect("catalog array").iter().any(|c| c["id"] == course["id"]),
        "draft leaked into the public catalog"
    );

    let full: Value = admin
        .get(format!("{}/api/admin/courses", base_url()))
        .send()
        .await
        .expect("admin catalog request failed")
        .json()
        .await
        .expect("admin catalog response not JSON");
    assert!(full.as_array().expect("admin catalog array").iter().any(|c| c["id"] == course["id"]));

    // Publish it and confirm it surfaces publicly.
    let resp = admin
        .put(format!("{}/api/admin/courses/{}", base_url(), course["id"]))
        .json(&json!({"published": true}))
        .send()
        .await
        .expect("publish request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let public: Value = client()
        .get(format!("{}/api/courses", base_url()))
        .send()
        .await
        .expect("catalog request failed")
        .json()
        .await
        .expect("catalog response not JSON");
    assert!(public.as_array().expect("catalog array").iter().any(|c| c["id"] == course["id"]));
}

#[tokio::test]
#[ignore = "Requires running server, database, and seeded admin account"]
async fn deleting_a_course_removes_its_enrollments() {
    let suffix = unique();
    let admin = admin_client().await;

    let instructor = client();
    signup(&instructor, &format!("dinst_{suffix}"), &format!("di{suffix}@test.example"), "instructor").await;
    let course = create_course(&instructor, &format!("Doomed {suffix}"), "0", true).await;

    let student = client();
    signup(&student, &format!("dstud_{suffix}"), &format!("ds{suffix}@test.example"), "student").await;
    let resp = student
        .post(format!("{}/api/enrollments", base_url()))
        .json(&json!({"course_id": course["id"]}))
        .send()
        .await
        .expect("enroll request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = admin
        .delete(format!("{}/api/admin/courses/{}", base_url(), course["id"]))
        .send()
        .await
        .expect("delete request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // The student's dashboard no longer shows the course.
    let my_courses: Value = student
        .get(format!("{}/api/enrollments/my-courses", base_url()))
        .send()
        .await
        .expect("my-courses request failed")
        .json()
        .await
        .expect("my-courses response not JSON");
    assert!(
        !my_courses
            .as_array()
            .expect("my-courses array")
            .iter()
            .any(|e| e["course"]["id"] == course["id"]),
        "enrollment survived the course delete"
    );

    let resp = admin
        .delete(format!("{}/api/admin/courses/{}", base_url(), course["id"]))
        .send()
        .await
        .expect("second delete request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server, database, and seeded admin account"]
async fn deleting_a_user_with_payment_history_succeeds() {
    let suffix = unique();
    let admin = admin_client().await;

    let instructor = client();
    signup(&instructor, &format!("pyinst_{suffix}"), &format!("py{suffix}@test.example"), "instructor").await;
    let course = create_course(&instructor, &format!("Paid {suffix}"), "39.99", true).await;

    let student = client();
    let email = format!("pys{suffix}@test.example");
    let user = signup(&student, &format!("pystud_{suffix}"), &email, "student").await;

    // A completed checkout leaves a payment row carrying the user's id.
    let session_id = format!("cs_test_py{suffix}");
    let payload = serde_json::to_vec(&json!({
        "id": format!("evt_{session_id}"),
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "status": "complete",
                "amount_total": 3999,
                "currency": "usd",
                "payment_intent": format!("pi_{session_id}"),
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
    let timestamp = i64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before epoch")
            .as_secs(),
    )
    .expect("timestamp fits i64");
    let resp = client()
        .post(format!("{}/api/payments/webhook", base_url()))
        .header("gateway-signature", sign_webhook(&webhook_secret(), &payload, timestamp))
        .header("content-type", "application/json")
        .body(payload)
        .send()
        .await
        .expect("webhook request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    // The payment row must not block account deletion.
    let resp = admin
        .delete(format!("{}/api/admin/users/{}", base_url(), user["id"]))
        .send()
        .await
        .expect("delete request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let users: Value = admin
        .get(format!("{}/api/admin/users", base_url()))
        .send()
        .await
        .expect("users request failed")
        .json()
        .await
        .expect("users response not JSON");
    assert!(
        !users.as_array().expect("users array").iter().any(|u| u["id"] == user["id"]),
        "deleted user still listed"
    );
}

#[tokio::test]
#[ignore = "Requires running server, database, and seeded admin account"]
async fn platform_stats_have_the_expected_shape() {
    let admin = admin_client().await;

    let stats: Value = admin
        .get(format!("{}/api/admin/stats", base_url()))
        .send()
        .await
        .expect("stats request failed")
        .json()
        .await
        .expect("stats response not JSON");

    for field in [
        "total_users",
        "total_students",
        "total_instructors",
        "total_courses",
        "published_courses",
        "unpublished_courses",
        "total_enrollments",
        "succeeded_payments",
        "total_revenue",
    ] {
        assert!(stats[field].is_i64(), "missing or non-numeric field {field}");
    }

    let recent_users = stats["recent_users"].as_array().expect("recent_users array");
    assert!(recent_users.len() <= 5);
    for user in recent_users {
        assert!(user["username"].is_string());
        assert!(user["role"].is_string());
    }

    let recent = stats["recent_enrollments"].as_array().expect("recent_enrollments array");
    assert!(recent.len() <= 5);
    for enrollment in recent {
        assert!(enrollment["student_username"].is_string());
        assert!(enrollment["course_title"].is_string());
    }
}
