//! Admin panel endpoints.
//!
//! All handlers take [`RequireAdmin`]; there is no ambient admin flag
//! anywhere else in the system.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use coursehub_core::{CourseId, UserId, UserRole};

use crate::db::courses::{CourseFilter, CourseRepository};
use crate::db::enrollments::{EnrolledCourse, EnrollmentRepository};
use crate::db::stats::{PlatformStats, StatsRepository};
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Course, CourseSummary, User};
use crate::state::AppState;

/// `GET /api/admin/users`
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list().await?;

    Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: UserRole,
}

/// `PUT /api/admin/users/{id}`
///
/// Role changes only. Admins cannot change their own role, so the last
/// admin can't lock everyone out by accident.
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<UserId>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    if user_id == admin.id {
        return Err(AppError::BadRequest(
            "admins cannot change their own role".to_string(),
        ));
    }

    let user = UserRepository::new(state.pool())
        .update_role(user_id, request.role)
        .await?;

    tracing::info!(user_id = %user_id, role = %request.role, admin_id = %admin.id, "role changed");

    Ok(Json(user))
}

/// `DELETE /api/admin/users/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<UserId>,
) -> Result<StatusCode> {
    if user_id == admin.id {
        return Err(AppError::BadRequest(
            "admins cannot delete their own account".to_string(),
        ));
    }

    let deleted = UserRepository::new(state.pool())
        .delete_with_enrollments(user_id)
        .await?;

    if !deleted {
        return Err(AppError::NotFound("user not found".to_string()));
    }

    tracing::info!(user_id = %user_id, admin_id = %admin.id, "user deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/admin/users/{id}/enrollments`
pub async fn user_enrollments(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<EnrolledCourse>>> {
    let enrollments = EnrollmentRepository::new(state.pool())
        .list_for_student(user_id)
        .await?;

    Ok(Json(enrollments))
}

/// `GET /api/admin/courses`
///
/// Full catalog including unpublished courses.
pub async fn list_courses(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<CourseSummary>>> {
    let filter = CourseFilter {
        include_unpublished: true,
        ..CourseFilter::default()
    };

    let courses = CourseRepository::new(state.pool()).list(&filter).await?;

    Ok(Json(courses))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCourseRequest {
    pub published: bool,
}

/// `PUT /api/admin/courses/{id}`
///
/// Moderation toggle for the published flag; content edits stay with the
/// owning instructor.
pub async fn update_course(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(course_id): Path<CourseId>,
    Json(request): Json<UpdateCourseRequest>,
) -> Result<Json<Course>> {
    let course = CourseRepository::new(state.pool())
        .set_published(course_id, request.published)
        .await?;

    Ok(Json(course))
}

/// `DELETE /api/admin/courses/{id}`
pub async fn delete_course(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(course_id): Path<CourseId>,
) -> Result<StatusCode> {
    let deleted = CourseRepository::new(state.pool())
        .delete_with_enrollments(course_id)
        .await?;

    if !deleted {
        return Err(AppError::NotFound("course not found".to_string()));
    }

    tracing::info!(course_id = %course_id, admin_id = %admin.id, "course deleted by admin");

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/admin/stats`
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<PlatformStats>> {
    let stats = StatsRepository::new(state.pool()).platform().await?;

    Ok(Json(stats))
}
