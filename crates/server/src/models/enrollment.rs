//! Enrollment domain type and progress aggregation.
//!
//! An enrollment is the join between a student and a course, unique per
//! pair. It carries a frozen snapshot of the course's lesson ids taken at
//! enroll time, so progress tracking is unaffected by later course edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursehub_core::{CourseId, EnrollmentId, LessonId, UserId};

use super::course::Lesson;

/// Per-lesson completion state inside an enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonProgress {
    /// Lesson this entry tracks (from the enroll-time snapshot).
    pub lesson_id: LessonId,
    /// Whether the student has completed the lesson.
    pub completed: bool,
    /// When the lesson was completed; cleared on un-completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A student's enrollment in a course (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Enrollment {
    /// Unique enrollment ID.
    pub id: EnrollmentId,
    /// The enrolled student.
    pub student_id: UserId,
    /// The course enrolled in.
    pub course_id: CourseId,
    /// One entry per lesson in the enroll-time snapshot.
    pub progress: Vec<LessonProgress>,
    /// Lesson count at enroll time (frozen snapshot).
    pub total_lessons: i32,
    /// Count of completed progress entries (derived).
    pub completed_lessons: i32,
    /// round(100 * completed / total), or 0 when the snapshot is empty.
    pub completion_percentage: i32,
    /// When the enrollment was created.
    pub enrolled_at: DateTime<Utc>,
    /// Set when completion reaches 100%; cleared if it later drops below.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Error marking progress against a lesson outside the snapshot.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("lesson {lesson_id} is not part of this enrollment")]
pub struct UnknownLesson {
    /// The rejected lesson id.
    pub lesson_id: LessonId,
}

impl Enrollment {
    /// Build the zero-initialized progress snapshot for a lesson list.
    #[must_use]
    pub fn snapshot_progress(lessons: &[Lesson]) -> Vec<LessonProgress> {
        lessons
            .iter()
            .map(|l| LessonProgress {
                lesson_id: l.id,
                completed: false,
                completed_at: None,
            })
            .collect()
    }

    /// Set a single lesson's completion state and recompute aggregates.
    ///
    /// The lesson must exist in the enroll-time snapshot; unknown lesson
    /// ids are rejected rather than appended, so a stale client cannot
    /// drift the completed count past the snapshot total.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownLesson`] if the lesson id is not in the snapshot.
    pub fn set_lesson_completed(
        &mut self,
        lesson_id: LessonId,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<(), UnknownLesson> {
        let entry = self
            .progress
            .iter_mut()
            .find(|p| p.lesson_id == lesson_id)
            .ok_or(UnknownLesson { lesson_id })?;

        entry.completed = completed;
        entry.completed_at = completed.then_some(now);

        self.recompute_aggregates(now);
        Ok(())
    }

    /// Recompute `completed_lessons`, `completion_percentage`, and the
    /// course-level `completed_at` from the progress entries.
    fn recompute_aggregates(&mut self, now: DateTime<Utc>) {
        let completed = self.progress.iter().filter(|p| p.completed).count();
        self.completed_lessons = i32::try_from(completed).unwrap_or(i32::MAX);

        self.completion_percentage = if self.total_lessons > 0 {
            let pct = f64::from(self.completed_lessons) * 100.0 / f64::from(self.total_lessons);
            #[allow(clippy::cast_possible_truncation)] // bounded to 0..=100
            {
                pct.round() as i32
            }
        } else {
            0
        };

        // Completion timestamp follows the percentage both ways: reaching
        // 100% sets it once, dropping below clears it.
        if self.completion_percentage >= 100 {
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enrollment_with_lessons(n: usize) -> (Enrollment, Vec<LessonId>) {
        let ids: Vec<LessonId> = (0..n).map(|_| LessonId::generate()).collect();
        let progress = ids
            .iter()
            .map(|&lesson_id| LessonProgress {
                lesson_id,
                completed: false,
                completed_at: None,
            })
            .collect();
        let enrollment = Enrollment {
            id: EnrollmentId::new(1),
            student_id: UserId::new(1),
            course_id: CourseId::new(1),
            progress,
            total_lessons: i32::try_from(n).unwrap(),
            completed_lessons: 0,
            completion_percentage: 0,
            enrolled_at: Utc::now(),
            completed_at: None,
        };
        (enrollment, ids)
    }

    #[test]
    fn test_two_lessons_fifty_then_hundred() {
        let (mut e, ids) = enrollment_with_lessons(2);
        let now = Utc::now();

        e.set_lesson_completed(ids[0], true, now).unwrap();
        assert_eq!(e.completion_percentage, 50);
        assert_eq!(e.completed_lessons, 1);
        assert!(e.completed_at.is_none());

        e.set_lesson_completed(ids[1], true, now).unwrap();
        assert_eq!(e.completion_percentage, 100);
        assert!(e.completed_at.is_some());
    }

    #[test]
    fn test_uncomplete_clears_completed_at() {
        let (mut e, ids) = enrollment_with_lessons(2);
        let now = Utc::now();
        e.set_lesson_completed(ids[0], true, now).unwrap();
        e.set_lesson_completed(ids[1], true, now).unwrap();
        assert!(e.completed_at.is_some());

        e.set_lesson_completed(ids[0], false, now).unwrap();
        assert_eq!(e.completion_percentage, 50);
        assert!(e.completed_at.is_none());
        assert!(e.progress[0].completed_at.is_none());
    }

    #[test]
    fn test_completed_at_not_overwritten_at_hundred() {
        let (mut e, ids) = enrollment_with_lessons(1);
        let first = Utc::now();
        e.set_lesson_completed(ids[0], true, first).unwrap();
        let stamp = e.completed_at;

        // Re-marking the same lesson complete keeps the original timestamp.
        let later = first + chrono::Duration::hours(1);
        e.set_lesson_completed(ids[0], true, later).unwrap();
        assert_eq!(e.completed_at, stamp);
    }

    #[test]
    fn test_rounding() {
        let (mut e, ids) = enrollment_with_lessons(3);
        let now = Utc::now();
        e.set_lesson_completed(ids[0], true, now).unwrap();
        // 1/3 -> 33.33 -> 33
        assert_eq!(e.completion_percentage, 33);
        e.set_lesson_completed(ids[1], true, now).unwrap();
        // 2/3 -> 66.67 -> 67
        assert_eq!(e.completion_percentage, 67);
    }

    #[test]
    fn test_zero_lessons_no_division() {
        let (mut e, _) = enrollment_with_lessons(0);
        let bogus = LessonId::generate();
        assert!(e.set_lesson_completed(bogus, true, Utc::now()).is_err());
        assert_eq!(e.completion_percentage, 0);
    }

    #[test]
    fn test_unknown_lesson_rejected() {
        let (mut e, _) = enrollment_with_lessons(2);
        let stranger = LessonId::generate();
        let err = e
            .set_lesson_completed(stranger, true, Utc::now())
            .unwrap_err();
        assert_eq!(err.lesson_id, stranger);
        // Nothing changed.
        assert_eq!(e.completed_lessons, 0);
        assert_eq!(e.progress.len(), 2);
    }

    #[test]
    fn test_snapshot_progress_zero_initialized() {
        use crate::models::course::Lesson;

        let lessons: Vec<Lesson> = (0..3)
            .map(|i| Lesson {
                id: LessonId::generate(),
                title: format!("L{i}"),
                description: String::new(),
                video_url: String::new(),
                duration: 5,
                position: i,
                free_preview: false,
            })
            .collect();

        let progress = Enrollment::snapshot_progress(&lessons);
        assert_eq!(progress.len(), 3);
        assert!(progress.iter().all(|p| !p.completed && p.completed_at.is_none()));
        assert_eq!(progress[1].lesson_id, lessons[1].id);
    }
}
