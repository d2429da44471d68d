//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (DB ping)
//!
//! # Auth
//! POST /api/auth/signup                 - Create account + session
//! POST /api/auth/login                  - Password login
//! POST /api/auth/logout                 - End session
//! GET  /api/auth/me                     - Current account
//!
//! # Catalog
//! GET  /api/courses                     - Published catalog (filters)
//! POST /api/courses                     - Create course (instructor)
//! GET  /api/courses/{id}                - Course detail (gated videos)
//! PUT  /api/courses/{id}                - Replace course (owner/admin)
//! DELETE /api/courses/{id}              - Delete course (owner/admin)
//!
//! # Enrollments
//! POST /api/enrollments                 - Enroll in a free course
//! GET  /api/enrollments?course_id=      - Own enrollment for a course
//! GET  /api/enrollments/check           - Enrollment check
//! GET  /api/enrollments/my-courses      - Student dashboard
//! GET  /api/enrollments/roster          - Course roster (owner/admin)
//! PUT  /api/enrollments/progress        - Lesson completion
//!
//! # Payments
//! POST /api/payments/create-checkout    - Start checkout / free enroll
//! POST /api/payments/verify-payment     - Reconcile after redirect
//! POST /api/payments/webhook            - Signed gateway deliveries
//!
//! # Instructor
//! GET  /api/instructor/stats            - Dashboard aggregates
//! GET  /api/instructor/courses          - Own courses incl. drafts
//!
//! # Admin
//! GET  /api/admin/users                 - All accounts
//! PUT  /api/admin/users/{id}            - Change role
//! DELETE /api/admin/users/{id}          - Delete account
//! GET  /api/admin/users/{id}/enrollments - Account's enrollments
//! GET  /api/admin/courses               - Full catalog incl. drafts
//! PUT  /api/admin/courses/{id}          - Publish/unpublish
//! DELETE /api/admin/courses/{id}        - Delete any course
//! GET  /api/admin/stats                 - Platform totals
//! ```

pub mod admin;
pub mod auth;
pub mod courses;
pub mod enrollments;
pub mod instructor;
pub mod payments;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the course routes router.
pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(courses::list).post(courses::create))
        .route(
            "/{id}",
            get(courses::get)
                .put(courses::update)
                .delete(courses::delete),
        )
}

/// Create the enrollment routes router.
pub fn enrollment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(enrollments::my_enrollment).post(enrollments::enroll),
        )
        .route("/check", get(enrollments::check))
        .route("/my-courses", get(enrollments::my_courses))
        .route("/roster", get(enrollments::roster))
        .route("/progress", put(enrollments::update_progress))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/create-checkout", post(payments::create_checkout))
        .route("/verify-payment", post(payments::verify_payment))
        .route("/webhook", post(payments::webhook))
}

/// Create the instructor routes router.
pub fn instructor_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(instructor::stats))
        .route("/courses", get(instructor::courses))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route("/users/{id}/enrollments", get(admin::user_enrollments))
        .route("/courses", get(admin::list_courses))
        .route(
            "/courses/{id}",
            put(admin::update_course).delete(admin::delete_course),
        )
        .route("/stats", get(admin::stats))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/courses", course_routes())
        .nest("/api/enrollments", enrollment_routes())
        .nest("/api/payments", payment_routes())
        .nest("/api/instructor", instructor_routes())
        .nest("/api/admin", admin_routes())
}
