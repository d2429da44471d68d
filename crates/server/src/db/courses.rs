//! Course repository for database operations.
//!
//! Lessons live in a JSONB column on the course row and are replaced as a
//! whole on update. `total_duration` is derived from the lesson list at
//! write time, never trusted from the client.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use coursehub_core::{CourseCategory, CourseId, CourseLevel, Price, UserId};

use super::RepositoryError;
use crate::models::{Course, CourseSummary, Lesson};

/// Raw `courses` row.
#[derive(sqlx::FromRow)]
struct CourseRow {
    id: CourseId,
    title: String,
    description: String,
    instructor_id: UserId,
    category: CourseCategory,
    level: CourseLevel,
    price: Price,
    thumbnail: String,
    lessons: Json<Vec<Lesson>>,
    total_duration: i32,
    enrollment_count: i32,
    published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            instructor_id: row.instructor_id,
            category: row.category,
            level: row.level,
            price: row.price,
            thumbnail: row.thumbnail,
            lessons: row.lessons.0,
            total_duration: row.total_duration,
            enrollment_count: row.enrollment_count,
            published: row.published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COURSE_COLUMNS: &str = "id, title, description, instructor_id, category, level, price, \
     thumbnail, lessons, total_duration, enrollment_count, published, created_at, updated_at";

/// Fields for creating or fully replacing a course.
///
/// `total_duration` is computed from `lessons`, so it is absent here.
#[derive(Debug)]
pub struct CourseData {
    pub title: String,
    pub description: String,
    pub category: CourseCategory,
    pub level: CourseLevel,
    pub price: Price,
    pub thumbnail: String,
    pub lessons: Vec<Lesson>,
    pub published: bool,
}

/// Filters for catalog listings.
#[derive(Debug, Default)]
pub struct CourseFilter {
    /// Restrict to a category.
    pub category: Option<CourseCategory>,
    /// Restrict to a difficulty level.
    pub level: Option<CourseLevel>,
    /// Case-insensitive substring match on title or description.
    pub search: Option<String>,
    /// Restrict to one instructor's courses.
    pub instructor_id: Option<UserId>,
    /// Include unpublished courses (admin and instructor views).
    pub include_unpublished: bool,
}

/// Repository for course database operations.
pub struct CourseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CourseRepository<'a> {
    /// Create a new course repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a course by ID, including its full lesson list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CourseId) -> Result<Option<Course>, RepositoryError> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {COURSE_COLUMNS} FROM coursehub.courses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Course::from))
    }

    /// List courses matching a filter, newest first, without lesson bodies.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &CourseFilter) -> Result<Vec<CourseSummary>, RepositoryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT c.id, c.title, c.instructor_id, u.username AS instructor_username, \
             c.category, c.level, c.price, c.thumbnail, c.total_duration, \
             c.enrollment_count, c.published, c.created_at \
             FROM coursehub.courses c \
             JOIN coursehub.users u ON u.id = c.instructor_id \
             WHERE TRUE",
        );

        if !filter.include_unpublished {
            qb.push(" AND c.published");
        }
        if let Some(category) = filter.category {
            qb.push(" AND c.category = ").push_bind(category);
        }
        if let Some(level) = filter.level {
            qb.push(" AND c.level = ").push_bind(level);
        }
        if let Some(instructor_id) = filter.instructor_id {
            qb.push(" AND c.instructor_id = ").push_bind(instructor_id);
        }
        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (c.title ILIKE ").push_bind(pattern.clone());
            qb.push(" OR c.description ILIKE ").push_bind(pattern);
            qb.push(")");
        }

        qb.push(" ORDER BY c.created_at DESC");

        let rows = qb
            .build_query_as::<SummaryRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(CourseSummary::from).collect())
    }

    /// Create a course owned by the given instructor.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        instructor_id: UserId,
        data: &CourseData,
    ) -> Result<Course, RepositoryError> {
        let total_duration = Course::total_duration_of(&data.lessons);

        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "INSERT INTO coursehub.courses
                 (title, description, instructor_id, category, level, price,
                  thumbnail, lessons, total_duration, published)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(&data.title)
        .bind(&data.description)
        .bind(instructor_id)
        .bind(data.category)
        .bind(data.level)
        .bind(data.price)
        .bind(&data.thumbnail)
        .bind(Json(&data.lessons))
        .bind(total_duration)
        .bind(data.published)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Fully replace a course's editable fields, including the lesson list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the course doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&self, id: CourseId, data: &CourseData) -> Result<Course, RepositoryError> {
        let total_duration = Course::total_duration_of(&data.lessons);

        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "UPDATE coursehub.courses
             SET title = $2, description = $3, category = $4, level = $5,
                 price = $6, thumbnail = $7, lessons = $8, total_duration = $9,
                 published = $10, updated_at = now()
             WHERE id = $1
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.category)
        .bind(data.level)
        .bind(data.price)
        .bind(&data.thumbnail)
        .bind(Json(&data.lessons))
        .bind(total_duration)
        .bind(data.published)
        .fetch_optional(self.pool)
        .await?;

        row.map(Course::from).ok_or(RepositoryError::NotFound)
    }

    /// Toggle only the published flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the course doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_published(
        &self,
        id: CourseId,
        published: bool,
    ) -> Result<Course, RepositoryError> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "UPDATE coursehub.courses
             SET published = $2, updated_at = now()
             WHERE id = $1
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(id)
        .bind(published)
        .fetch_optional(self.pool)
        .await?;

        row.map(Course::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a course and all enrollments referencing it.
    ///
    /// # Returns
    ///
    /// `true` if the course was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn delete_with_enrollments(&self, id: CourseId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM coursehub.enrollments WHERE course_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM coursehub.payments WHERE course_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM coursehub.courses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Raw catalog listing row.
#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: CourseId,
    title: String,
    instructor_id: UserId,
    instructor_username: String,
    category: CourseCategory,
    level: CourseLevel,
    price: Price,
    thumbnail: String,
    total_duration: i32,
    enrollment_count: i32,
    published: bool,
    created_at: DateTime<Utc>,
}

impl From<SummaryRow> for CourseSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            instructor_id: row.instructor_id,
            instructor_username: row.instructor_username,
            category: row.category,
            level: row.level,
            price: row.price,
            thumbnail: row.thumbnail,
            total_duration: row.total_duration,
            enrollment_count: row.enrollment_count,
            published: row.published,
            created_at: row.created_at,
        }
    }
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_handles_metacharacters() {
        assert_eq!(escape_like("100% rust"), "100\\% rust");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
