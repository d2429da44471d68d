//! Enrollment service.
//!
//! Every path that can create an enrollment funnels through [`EnrollmentService::enroll`]:
//! the free-course direct flow, the checkout verify flow, and the webhook
//! flow. The database's unique (student, course) constraint makes the
//! operation convergent: payment-driven callers that lose the race get
//! the existing row back, while a repeated direct enroll is a client
//! error.

use sqlx::PgPool;

use coursehub_core::{CourseId, UserId};

use crate::db::RepositoryError;
use crate::db::courses::CourseRepository;
use crate::db::enrollments::EnrollmentRepository;
use crate::error::AppError;
use crate::models::Enrollment;

/// Which flow is asking for the enrollment.
///
/// Direct enrollment is student-initiated and only valid for free,
/// published courses. Payment-driven flows skip those checks because the
/// purchase already happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollSource {
    /// Student clicked "enroll" on a free course.
    Direct,
    /// Checkout verify endpoint confirmed a paid session.
    Checkout,
    /// Gateway webhook reported a completed session.
    Webhook,
}

/// Result of an enroll call.
#[derive(Debug)]
pub struct EnrollOutcome {
    pub enrollment: Enrollment,
    /// False when the student was already enrolled.
    pub created: bool,
}

/// Enrollment service.
pub struct EnrollmentService<'a> {
    pool: &'a PgPool,
}

impl<'a> EnrollmentService<'a> {
    /// Create a new enrollment service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Enroll a student in a course, idempotently.
    ///
    /// The enrollment snapshot (lesson ids, total count) is taken from the
    /// course's lesson list at this moment; later course edits don't touch
    /// existing enrollments.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the course doesn't exist,
    /// `AppError::Forbidden` for a direct enroll into an unpublished
    /// course, and `AppError::BadRequest` for a direct enroll into a paid
    /// course or one the student is already enrolled in.
    pub async fn enroll(
        &self,
        student_id: UserId,
        course_id: CourseId,
        source: EnrollSource,
    ) -> Result<EnrollOutcome, AppError> {
        let courses = CourseRepository::new(self.pool);
        let enrollments = EnrollmentRepository::new(self.pool);

        let course = courses
            .get(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound("course not found".to_string()))?;

        if source == EnrollSource::Direct {
            if !course.published {
                return Err(AppError::Forbidden(
                    "course is not open for enrollment".to_string(),
                ));
            }
            if !course.price.is_free() {
                return Err(AppError::BadRequest(
                    "paid courses require checkout".to_string(),
                ));
            }
        }

        // Cheap pre-check; the unique constraint still backstops races.
        if let Some(existing) = enrollments.get_by_pair(student_id, course_id).await? {
            if source == EnrollSource::Direct {
                return Err(already_enrolled());
            }
            return Ok(EnrollOutcome {
                enrollment: existing,
                created: false,
            });
        }

        let progress = Enrollment::snapshot_progress(&course.lessons);

        match enrollments.create(student_id, course_id, &progress).await {
            Ok(enrollment) => Ok(EnrollOutcome {
                enrollment,
                created: true,
            }),
            // Lost the race to a concurrent enroll; the existing row wins.
            Err(RepositoryError::Conflict(_)) => {
                if source == EnrollSource::Direct {
                    return Err(already_enrolled());
                }
                let enrollment = enrollments
                    .get_by_pair(student_id, course_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal("enrollment conflict but no row found".to_string())
                    })?;
                Ok(EnrollOutcome {
                    enrollment,
                    created: false,
                })
            }
            Err(other) => Err(other.into()),
        }
    }
}

pub(crate) fn already_enrolled() -> AppError {
    AppError::BadRequest("already enrolled in this course".to_string())
}
