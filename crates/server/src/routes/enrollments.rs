//! Enrollment and progress endpoints.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use coursehub_core::{CourseId, LessonId, UserRole};

use crate::db::courses::CourseRepository;
use crate::db::enrollments::{CourseEnrollment, EnrolledCourse, EnrollmentRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, RequireInstructor};
use crate::models::Enrollment;
use crate::services::enrollment::{EnrollSource, EnrollmentService};
use crate::services::progress::ProgressService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub course_id: CourseId,
}

/// `POST /api/enrollments`
///
/// Direct enrollment into a free, published course. Enrolling twice is a
/// client error; paid courses go through checkout instead.
pub async fn enroll(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<Enrollment>)> {
    let outcome = EnrollmentService::new(state.pool())
        .enroll(user.id, request.course_id, EnrollSource::Direct)
        .await?;

    Ok((StatusCode::CREATED, Json(outcome.enrollment)))
}

#[derive(Debug, Deserialize)]
pub struct MyEnrollmentQuery {
    pub course_id: CourseId,
}

/// `GET /api/enrollments?course_id=`
///
/// The caller's own enrollment for a course, progress included.
pub async fn my_enrollment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MyEnrollmentQuery>,
) -> Result<Json<Enrollment>> {
    let enrollment = EnrollmentRepository::new(state.pool())
        .get_by_pair(user.id, query.course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("not enrolled in this course".to_string()))?;

    Ok(Json(enrollment))
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub course_id: CourseId,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub enrolled: bool,
}

/// `GET /api/enrollments/check?course_id=`
pub async fn check(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<CheckQuery>,
) -> Result<Json<CheckResponse>> {
    let enrolled = EnrollmentRepository::new(state.pool())
        .exists(user.id, query.course_id)
        .await?;

    Ok(Json(CheckResponse { enrolled }))
}

/// `GET /api/enrollments/my-courses`
pub async fn my_courses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<EnrolledCourse>>> {
    let enrollments = EnrollmentRepository::new(state.pool())
        .list_for_student(user.id)
        .await?;

    Ok(Json(enrollments))
}

#[derive(Debug, Deserialize)]
pub struct RosterQuery {
    pub course_id: CourseId,
}

/// `GET /api/enrollments/roster?course_id=`
///
/// Roster for one course: students with their progress. Restricted to the
/// course's instructor and admins.
pub async fn roster(
    State(state): State<AppState>,
    RequireInstructor(instructor): RequireInstructor,
    Query(query): Query<RosterQuery>,
) -> Result<Json<Vec<CourseEnrollment>>> {
    let course = CourseRepository::new(state.pool())
        .get(query.course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("course not found".to_string()))?;

    if instructor.role != UserRole::Admin && instructor.id != course.instructor_id {
        return Err(AppError::Forbidden(
            "only the course owner may view its roster".to_string(),
        ));
    }

    let enrollments = EnrollmentRepository::new(state.pool())
        .list_for_course(query.course_id)
        .await?;

    Ok(Json(enrollments))
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub course_id: CourseId,
    pub lesson_id: LessonId,
    pub completed: bool,
}

/// `PUT /api/enrollments/progress`
///
/// Marks one lesson complete or incomplete on the caller's own
/// enrollment and returns the recomputed aggregates.
pub async fn update_progress(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<ProgressRequest>,
) -> Result<Json<Enrollment>> {
    let enrollment = ProgressService::new(state.pool())
        .set_lesson_completed(
            user.id,
            request.course_id,
            request.lesson_id,
            request.completed,
        )
        .await?;

    Ok(Json(enrollment))
}
