//! Course and lesson domain types.
//!
//! Lessons are embedded documents: they live in the course's JSONB lesson
//! array and have no identity outside it, though each carries a [`LessonId`]
//! so enrollments can correlate per-lesson progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursehub_core::{CourseCategory, CourseId, CourseLevel, LessonId, Price, UserId};

/// A lesson embedded in a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Locally-unique ID used to correlate enrollment progress.
    pub id: LessonId,
    /// Lesson title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: String,
    /// Optional video reference.
    #[serde(default)]
    pub video_url: String,
    /// Duration in minutes.
    #[serde(default)]
    pub duration: i32,
    /// Position within the course's ordered lesson list.
    pub position: i32,
    /// Whether the lesson can be previewed without enrolling.
    #[serde(default)]
    pub free_preview: bool,
}

/// A course (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Course {
    /// Unique course ID.
    pub id: CourseId,
    /// Course title.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Owning instructor.
    pub instructor_id: UserId,
    /// Catalog category.
    pub category: CourseCategory,
    /// Difficulty level.
    pub level: CourseLevel,
    /// Price in major currency units; zero means free.
    pub price: Price,
    /// Thumbnail image reference.
    pub thumbnail: String,
    /// Ordered lesson list.
    pub lessons: Vec<Lesson>,
    /// Sum of lesson durations in minutes (derived).
    pub total_duration: i32,
    /// Number of enrollments, maintained transactionally with enrollment
    /// creation.
    pub enrollment_count: i32,
    /// Whether the course is visible in the public catalog.
    pub published: bool,
    /// When the course was created.
    pub created_at: DateTime<Utc>,
    /// When the course was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Sum the durations of a lesson list, saturating on overflow.
    #[must_use]
    pub fn total_duration_of(lessons: &[Lesson]) -> i32 {
        lessons
            .iter()
            .fold(0_i32, |sum, l| sum.saturating_add(l.duration.max(0)))
    }

    /// Whether the given lesson id belongs to this course.
    #[must_use]
    pub fn has_lesson(&self, lesson_id: LessonId) -> bool {
        self.lessons.iter().any(|l| l.id == lesson_id)
    }
}

/// A lightweight course listing row (no lesson bodies).
///
/// Used for catalog listings and enrollment joins where shipping the full
/// lesson array would be wasteful.
#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    pub id: CourseId,
    pub title: String,
    pub instructor_id: UserId,
    pub instructor_username: String,
    pub category: CourseCategory,
    pub level: CourseLevel,
    pub price: Price,
    pub thumbnail: String,
    pub total_duration: i32,
    pub enrollment_count: i32,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(duration: i32, position: i32) -> Lesson {
        Lesson {
            id: LessonId::generate(),
            title: format!("Lesson {position}"),
            description: String::new(),
            video_url: String::new(),
            duration,
            position,
            free_preview: false,
        }
    }

    #[test]
    fn test_total_duration_sums_lessons() {
        let lessons = vec![lesson(10, 0), lesson(25, 1), lesson(5, 2)];
        assert_eq!(Course::total_duration_of(&lessons), 40);
    }

    #[test]
    fn test_total_duration_ignores_negative() {
        let lessons = vec![lesson(10, 0), lesson(-3, 1)];
        assert_eq!(Course::total_duration_of(&lessons), 10);
    }

    #[test]
    fn test_total_duration_empty() {
        assert_eq!(Course::total_duration_of(&[]), 0);
    }
}
