//! Lesson progress service.

use chrono::Utc;
use sqlx::PgPool;

use coursehub_core::{CourseId, LessonId, UserId};

use crate::db::enrollments::EnrollmentRepository;
use crate::error::AppError;
use crate::models::Enrollment;

/// Progress tracking over a student's own enrollments.
pub struct ProgressService<'a> {
    pool: &'a PgPool,
}

impl<'a> ProgressService<'a> {
    /// Create a new progress service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Mark a lesson complete or incomplete and recompute the enrollment's
    /// aggregates.
    ///
    /// Lesson ids outside the enroll-time snapshot are rejected; progress
    /// can only move against lessons the enrollment actually tracks.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the student has no enrollment for
    /// the course or the lesson id is outside its snapshot.
    pub async fn set_lesson_completed(
        &self,
        student_id: UserId,
        course_id: CourseId,
        lesson_id: LessonId,
        completed: bool,
    ) -> Result<Enrollment, AppError> {
        let enrollments = EnrollmentRepository::new(self.pool);

        let mut enrollment = enrollments
            .get_by_pair(student_id, course_id)
            .await?
            .ok_or_else(|| AppError::NotFound("not enrolled in this course".to_string()))?;

        enrollment
            .set_lesson_completed(lesson_id, completed, Utc::now())
            .map_err(|e| AppError::NotFound(e.to_string()))?;

        enrollments.update_progress(&enrollment).await?;

        Ok(enrollment)
    }
}
