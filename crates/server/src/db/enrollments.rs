//! Enrollment repository for database operations.
//!
//! The unique `(student_id, course_id)` constraint is what every enroll
//! path (direct, checkout verify, webhook) converges on; the insert here
//! maps that violation to `Conflict` so callers can treat a duplicate as
//! idempotent success.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use coursehub_core::{CourseCategory, CourseId, CourseLevel, EnrollmentId, Price, UserId};

use super::RepositoryError;
use crate::models::{CourseSummary, Enrollment, LessonProgress};

/// Raw `enrollments` row.
#[derive(sqlx::FromRow)]
struct EnrollmentRow {
    id: EnrollmentId,
    student_id: UserId,
    course_id: CourseId,
    progress: Json<Vec<LessonProgress>>,
    total_lessons: i32,
    completed_lessons: i32,
    completion_percentage: i32,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<EnrollmentRow> for Enrollment {
    fn from(row: EnrollmentRow) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            course_id: row.course_id,
            progress: row.progress.0,
            total_lessons: row.total_lessons,
            completed_lessons: row.completed_lessons,
            completion_percentage: row.completion_percentage,
            enrolled_at: row.enrolled_at,
            completed_at: row.completed_at,
        }
    }
}

const ENROLLMENT_COLUMNS: &str = "id, student_id, course_id, progress, total_lessons, \
     completed_lessons, completion_percentage, enrolled_at, completed_at";

/// An enrollment joined with its course summary, for student dashboards.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EnrolledCourse {
    pub enrollment: Enrollment,
    pub course: CourseSummary,
}

/// An enrollment joined with student identity, for instructor rosters.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CourseEnrollment {
    pub enrollment: Enrollment,
    pub student_username: String,
    pub student_email: String,
}

/// Repository for enrollment database operations.
pub struct EnrollmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EnrollmentRepository<'a> {
    /// Create a new enrollment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an enrollment and bump the course's enrollment counter in
    /// one transaction.
    ///
    /// The progress snapshot must be zero-initialized from the course's
    /// current lesson list (see `Enrollment::snapshot_progress`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the student is already
    /// enrolled in the course.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        student_id: UserId,
        course_id: CourseId,
        progress: &[LessonProgress],
    ) -> Result<Enrollment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let total_lessons = i32::try_from(progress.len()).unwrap_or(i32::MAX);

        let row = sqlx::query_as::<_, EnrollmentRow>(&format!(
            "INSERT INTO coursehub.enrollments (student_id, course_id, progress, total_lessons)
             VALUES ($1, $2, $3, $4)
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(student_id)
        .bind(course_id)
        .bind(Json(progress))
        .bind(total_lessons)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| super::conflict_on_unique(e, "student is already enrolled in this course"))?;

        bump_enrollment_count(&mut tx, course_id, 1).await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Get an enrollment by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: EnrollmentId) -> Result<Option<Enrollment>, RepositoryError> {
        let row = sqlx::query_as::<_, EnrollmentRow>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM coursehub.enrollments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Enrollment::from))
    }

    /// Get the enrollment for a (student, course) pair, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_pair(
        &self,
        student_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        let row = sqlx::query_as::<_, EnrollmentRow>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM coursehub.enrollments
             WHERE student_id = $1 AND course_id = $2"
        ))
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Enrollment::from))
    }

    /// Whether a student is enrolled in a course.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(
        &self,
        student_id: UserId,
        course_id: CourseId,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM coursehub.enrollments
                 WHERE student_id = $1 AND course_id = $2
             )",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// List a student's enrollments with course summaries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_student(
        &self,
        student_id: UserId,
    ) -> Result<Vec<EnrolledCourse>, RepositoryError> {
        let rows = sqlx::query_as::<_, EnrolledCourseRow>(
            "SELECT e.id, e.student_id, e.course_id, e.progress, e.total_lessons,
                    e.completed_lessons, e.completion_percentage, e.enrolled_at, e.completed_at,
                    c.title AS course_title, c.instructor_id, u.username AS instructor_username,
                    c.category, c.level, c.price, c.thumbnail, c.total_duration,
                    c.enrollment_count, c.published, c.created_at AS course_created_at
             FROM coursehub.enrollments e
             JOIN coursehub.courses c ON c.id = e.course_id
             JOIN coursehub.users u ON u.id = c.instructor_id
             WHERE e.student_id = $1
             ORDER BY e.enrolled_at DESC",
        )
        .bind(student_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(EnrolledCourseRow::into_model).collect())
    }

    /// List a course's enrollments with student identity, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<CourseEnrollment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CourseEnrollmentRow>(
            "SELECT e.id, e.student_id, e.course_id, e.progress, e.total_lessons,
                    e.completed_lessons, e.completion_percentage, e.enrolled_at, e.completed_at,
                    u.username AS student_username, u.email AS student_email
             FROM coursehub.enrollments e
             JOIN coursehub.users u ON u.id = e.student_id
             WHERE e.course_id = $1
             ORDER BY e.enrolled_at DESC",
        )
        .bind(course_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(CourseEnrollmentRow::into_model)
            .collect())
    }

    /// Persist recomputed progress and aggregates for an enrollment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the enrollment doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_progress(&self, enrollment: &Enrollment) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE coursehub.enrollments
             SET progress = $2, completed_lessons = $3, completion_percentage = $4,
                 completed_at = $5, updated_at = now()
             WHERE id = $1",
        )
        .bind(enrollment.id)
        .bind(Json(&enrollment.progress))
        .bind(enrollment.completed_lessons)
        .bind(enrollment.completion_percentage)
        .bind(enrollment.completed_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Adjust a course's denormalized enrollment counter inside a transaction.
async fn bump_enrollment_count(
    tx: &mut Transaction<'_, Postgres>,
    course_id: CourseId,
    delta: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE coursehub.courses
         SET enrollment_count = GREATEST(enrollment_count + $2, 0), updated_at = now()
         WHERE id = $1",
    )
    .bind(course_id)
    .bind(delta)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[derive(sqlx::FromRow)]
struct EnrolledCourseRow {
    id: EnrollmentId,
    student_id: UserId,
    course_id: CourseId,
    progress: Json<Vec<LessonProgress>>,
    total_lessons: i32,
    completed_lessons: i32,
    completion_percentage: i32,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    course_title: String,
    instructor_id: UserId,
    instructor_username: String,
    category: CourseCategory,
    level: CourseLevel,
    price: Price,
    thumbnail: String,
    total_duration: i32,
    enrollment_count: i32,
    published: bool,
    course_created_at: DateTime<Utc>,
}

impl EnrolledCourseRow {
    fn into_model(self) -> EnrolledCourse {
        EnrolledCourse {
            enrollment: Enrollment {
                id: self.id,
                student_id: self.student_id,
                course_id: self.course_id,
                progress: self.progress.0,
                total_lessons: self.total_lessons,
                completed_lessons: self.completed_lessons,
                completion_percentage: self.completion_percentage,
                enrolled_at: self.enrolled_at,
                completed_at: self.completed_at,
            },
            course: CourseSummary {
                id: self.course_id,
                title: self.course_title,
                instructor_id: self.instructor_id,
                instructor_username: self.instructor_username,
                category: self.category,
                level: self.level,
                price: self.price,
                thumbnail: self.thumbnail,
                total_duration: self.total_duration,
                enrollment_count: self.enrollment_count,
                published: self.published,
                created_at: self.course_created_at,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct CourseEnrollmentRow {
    id: EnrollmentId,
    student_id: UserId,
    course_id: CourseId,
    progress: Json<Vec<LessonProgress>>,
    total_lessons: i32,
    completed_lessons: i32,
    completion_percentage: i32,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    student_username: String,
    student_email: String,
}

impl CourseEnrollmentRow {
    fn into_model(self) -> CourseEnrollment {
        CourseEnrollment {
            enrollment: Enrollment {
                id: self.id,
                student_id: self.student_id,
                course_id: self.course_id,
                progress: self.progress.0,
                total_lessons: self.total_lessons,
                completed_lessons: self.completed_lessons,
                completion_percentage: self.completion_percentage,
                enrolled_at: self.enrolled_at,
                completed_at: self.completed_at,
            },
            student_username: self.student_username,
            student_email: self.student_email,
        }
    }
}
