//! Aggregate queries backing the admin and instructor dashboards.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use coursehub_core::{CourseId, EnrollmentId, UserId, UserRole};

use super::RepositoryError;

/// How many rows the "recent activity" lists carry.
const RECENT_LIMIT: i64 = 5;

/// A recently created account, for the admin dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecentUser {
    pub id: UserId,
    pub username: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// A recent enrollment with display names resolved.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecentEnrollment {
    pub id: EnrollmentId,
    pub student_username: String,
    pub course_id: CourseId,
    pub course_title: String,
    pub enrolled_at: DateTime<Utc>,
}

/// Platform-wide totals for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformStats {
    pub total_users: i64,
    pub total_students: i64,
    pub total_instructors: i64,
    pub total_courses: i64,
    pub published_courses: i64,
    pub unpublished_courses: i64,
    pub total_enrollments: i64,
    pub succeeded_payments: i64,
    /// Gross revenue from succeeded payments, in minor units.
    pub total_revenue: i64,
    pub recent_users: Vec<RecentUser>,
    pub recent_enrollments: Vec<RecentEnrollment>,
}

/// Per-course totals for the instructor dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct CourseStats {
    pub course_id: CourseId,
    pub title: String,
    pub published: bool,
    pub enrollment_count: i64,
    /// Revenue from succeeded payments for this course, in minor units.
    pub revenue: i64,
    /// Mean completion percentage across enrollments (0 when none).
    pub average_completion: i64,
}

/// Instructor dashboard payload.
#[derive(Debug, Clone, Serialize)]
pub struct InstructorStats {
    pub total_courses: i64,
    pub total_students: i64,
    pub total_revenue: i64,
    pub courses: Vec<CourseStats>,
    pub recent_enrollments: Vec<RecentEnrollment>,
}

/// Repository for dashboard aggregates.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Compute platform-wide totals and recent activity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn platform(&self) -> Result<PlatformStats, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            total_users: i64,
            total_students: i64,
            total_instructors: i64,
            total_courses: i64,
            published_courses: i64,
            total_enrollments: i64,
            succeeded_payments: i64,
            total_revenue: i64,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT
                 (SELECT count(*) FROM coursehub.users) AS total_users,
                 (SELECT count(*) FROM coursehub.users WHERE role = 'student') AS total_students,
                 (SELECT count(*) FROM coursehub.users WHERE role = 'instructor') AS total_instructors,
                 (SELECT count(*) FROM coursehub.courses) AS total_courses,
                 (SELECT count(*) FROM coursehub.courses WHERE published) AS published_courses,
                 (SELECT count(*) FROM coursehub.enrollments) AS total_enrollments,
                 (SELECT count(*) FROM coursehub.payments
                  WHERE status = 'succeeded') AS succeeded_payments,
                 (SELECT COALESCE(sum(amount), 0) FROM coursehub.payments
                  WHERE status = 'succeeded') AS total_revenue",
        )
        .fetch_one(self.pool)
        .await?;

        let recent_users = sqlx::query_as::<_, RecentUser>(
            "SELECT id, username, role, created_at
             FROM coursehub.users
             ORDER BY created_at DESC
             LIMIT $1",
        )
        .bind(RECENT_LIMIT)
        .fetch_all(self.pool)
        .await?;

        let recent_enrollments = self.recent_enrollments(None).await?;

        Ok(PlatformStats {
            total_users: row.total_users,
            total_students: row.total_students,
            total_instructors: row.total_instructors,
            total_courses: row.total_courses,
            published_courses: row.published_courses,
            unpublished_courses: row.total_courses - row.published_courses,
            total_enrollments: row.total_enrollments,
            succeeded_payments: row.succeeded_payments,
            total_revenue: row.total_revenue,
            recent_users,
            recent_enrollments,
        })
    }

    /// Compute per-course and overall totals for one instructor.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn instructor(&self, instructor_id: UserId) -> Result<InstructorStats, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            course_id: CourseId,
            title: String,
            published: bool,
            enrollment_count: i64,
            revenue: i64,
            average_completion: i64,
        }

        let rows = sqlx::query_as::<_, Row>(
            "SELECT c.id AS course_id, c.title, c.published,
                    (SELECT count(*) FROM coursehub.enrollments e
                     WHERE e.course_id = c.id) AS enrollment_count,
                    (SELECT COALESCE(sum(p.amount), 0) FROM coursehub.payments p
                     WHERE p.course_id = c.id AND p.status = 'succeeded') AS revenue,
                    (SELECT COALESCE(round(avg(e.completion_percentage)), 0)::bigint
                     FROM coursehub.enrollments e
                     WHERE e.course_id = c.id) AS average_completion
             FROM coursehub.courses c
             WHERE c.instructor_id = $1
             ORDER BY c.created_at DESC",
        )
        .bind(instructor_id)
        .fetch_all(self.pool)
        .await?;

        let courses: Vec<CourseStats> = rows
            .into_iter()
            .map(|r| CourseStats {
                course_id: r.course_id,
                title: r.title,
                published: r.published,
                enrollment_count: r.enrollment_count,
                revenue: r.revenue,
                average_completion: r.average_completion,
            })
            .collect();

        let total_students = courses.iter().map(|c| c.enrollment_count).sum();
        let total_revenue = courses.iter().map(|c| c.revenue).sum();

        let recent_enrollments = self.recent_enrollments(Some(instructor_id)).await?;

        Ok(InstructorStats {
            total_courses: i64::try_from(courses.len()).unwrap_or(i64::MAX),
            total_students,
            total_revenue,
            courses,
            recent_enrollments,
        })
    }

    /// Latest enrollments, platform-wide or scoped to one instructor's
    /// courses.
    async fn recent_enrollments(
        &self,
        instructor_id: Option<UserId>,
    ) -> Result<Vec<RecentEnrollment>, RepositoryError> {
        let rows = sqlx::query_as::<_, RecentEnrollment>(
            "SELECT e.id, u.username AS student_username,
                    c.id AS course_id, c.title AS course_title, e.enrolled_at
             FROM coursehub.enrollments e
             JOIN coursehub.users u ON u.id = e.student_id
             JOIN coursehub.courses c ON c.id = e.course_id
             WHERE $1::integer IS NULL OR c.instructor_id = $1
             ORDER BY e.enrolled_at DESC
             LIMIT $2",
        )
        .bind(instructor_id)
        .bind(RECENT_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
