//! Instructor dashboard endpoints.

use axum::{Json, extract::State};

use crate::db::courses::{CourseFilter, CourseRepository};
use crate::db::stats::{InstructorStats, StatsRepository};
use crate::error::Result;
use crate::middleware::RequireInstructor;
use crate::models::CourseSummary;
use crate::state::AppState;

/// `GET /api/instructor/stats`
///
/// Per-course enrollment, revenue, and completion aggregates for the
/// calling instructor.
pub async fn stats(
    State(state): State<AppState>,
    RequireInstructor(instructor): RequireInstructor,
) -> Result<Json<InstructorStats>> {
    let stats = StatsRepository::new(state.pool())
        .instructor(instructor.id)
        .await?;

    Ok(Json(stats))
}

/// `GET /api/instructor/courses`
///
/// The caller's own courses, published or not.
pub async fn courses(
    State(state): State<AppState>,
    RequireInstructor(instructor): RequireInstructor,
) -> Result<Json<Vec<CourseSummary>>> {
    let filter = CourseFilter {
        instructor_id: Some(instructor.id),
        include_unpublished: true,
        ..CourseFilter::default()
    };

    let courses = CourseRepository::new(state.pool()).list(&filter).await?;

    Ok(Json(courses))
}
