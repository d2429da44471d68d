//! Course catalog and authoring endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use coursehub_core::{CourseCategory, CourseId, CourseLevel, LessonId, Price, UserRole};

use crate::db::courses::{CourseData, CourseFilter, CourseRepository};
use crate::db::enrollments::EnrollmentRepository;
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireInstructor};
use crate::models::{Course, CourseSummary, Lesson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<CourseCategory>,
    pub level: Option<CourseLevel>,
    pub search: Option<String>,
}

/// Lesson as submitted by an authoring client.
///
/// Ids are optional on input: lessons the client created for the first
/// time get a fresh id here, while existing ids are preserved so
/// enrollment snapshots stay correlated across edits.
#[derive(Debug, Deserialize)]
pub struct LessonInput {
    #[serde(default)]
    pub id: Option<LessonId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub duration: i32,
    #[serde(default)]
    pub free_preview: bool,
}

#[derive(Debug, Deserialize)]
pub struct CourseRequest {
    pub title: String,
    pub description: String,
    pub category: CourseCategory,
    pub level: CourseLevel,
    pub price: Price,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub lessons: Vec<LessonInput>,
    #[serde(default)]
    pub published: bool,
}

impl CourseRequest {
    fn into_data(self) -> Result<CourseData> {
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest("title must not be empty".to_string()));
        }

        let lessons = self
            .lessons
            .into_iter()
            .enumerate()
            .map(|(position, input)| {
                if input.title.trim().is_empty() {
                    return Err(AppError::BadRequest(
                        "lesson titles must not be empty".to_string(),
                    ));
                }
                if input.duration < 0 {
                    return Err(AppError::BadRequest(
                        "lesson duration must not be negative".to_string(),
                    ));
                }
                Ok(Lesson {
                    id: input.id.unwrap_or_else(LessonId::generate),
                    title: input.title,
                    description: input.description,
                    video_url: input.video_url,
                    duration: input.duration,
                    position: i32::try_from(position).unwrap_or(i32::MAX),
                    free_preview: input.free_preview,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CourseData {
            title: self.title,
            description: self.description,
            category: self.category,
            level: self.level,
            price: self.price,
            thumbnail: self.thumbnail,
            lessons,
            published: self.published,
        })
    }
}

/// `GET /api/courses`
///
/// Public catalog: published courses only, filterable by category, level,
/// and a free-text search over title and description.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<CourseSummary>>> {
    let filter = CourseFilter {
        category: query.category,
        level: query.level,
        search: query.search.filter(|s| !s.trim().is_empty()),
        instructor_id: None,
        include_unpublished: false,
    };

    let courses = CourseRepository::new(state.pool()).list(&filter).await?;

    Ok(Json(courses))
}

/// `GET /api/courses/{id}`
///
/// Unpublished courses are visible only to their instructor and admins.
/// Video URLs are redacted for viewers without an enrollment, except for
/// free-preview lessons.
pub async fn get(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Path(course_id): Path<CourseId>,
) -> Result<Json<Course>> {
    let mut course = CourseRepository::new(state.pool())
        .get(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("course not found".to_string()))?;

    let is_privileged = viewer
        .as_ref()
        .is_some_and(|v| v.role == UserRole::Admin || v.id == course.instructor_id);

    if !course.published && !is_privileged {
        // Hide the existence of unpublished courses.
        return Err(AppError::NotFound("course not found".to_string()));
    }

    let enrolled = match viewer {
        Some(ref v) => {
            EnrollmentRepository::new(state.pool())
                .exists(v.id, course_id)
                .await?
        }
        None => false,
    };

    if !is_privileged && !enrolled {
        for lesson in &mut course.lessons {
            if !lesson.free_preview {
                lesson.video_url.clear();
            }
        }
    }

    Ok(Json(course))
}

/// `POST /api/courses`
pub async fn create(
    State(state): State<AppState>,
    RequireInstructor(instructor): RequireInstructor,
    Json(request): Json<CourseRequest>,
) -> Result<(StatusCode, Json<Course>)> {
    let data = request.into_data()?;

    let course = CourseRepository::new(state.pool())
        .create(instructor.id, &data)
        .await?;

    tracing::info!(course_id = %course.id, instructor_id = %instructor.id, "course created");

    Ok((StatusCode::CREATED, Json(course)))
}

/// `PUT /api/courses/{id}`
///
/// Full replacement of the course's editable fields. Owner or admin only.
pub async fn update(
    State(state): State<AppState>,
    RequireInstructor(instructor): RequireInstructor,
    Path(course_id): Path<CourseId>,
    Json(request): Json<CourseRequest>,
) -> Result<Json<Course>> {
    let repo = CourseRepository::new(state.pool());

    let existing = repo
        .get(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("course not found".to_string()))?;

    ensure_owner_or_admin(&instructor, &existing)?;

    let data = request.into_data()?;
    let course = repo.update(course_id, &data).await?;

    Ok(Json(course))
}

/// `DELETE /api/courses/{id}`
///
/// Deletes the course and its enrollments. Owner or admin only.
pub async fn delete(
    State(state): State<AppState>,
    RequireInstructor(instructor): RequireInstructor,
    Path(course_id): Path<CourseId>,
) -> Result<StatusCode> {
    let repo = CourseRepository::new(state.pool());

    let existing = repo
        .get(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("course not found".to_string()))?;

    ensure_owner_or_admin(&instructor, &existing)?;

    repo.delete_with_enrollments(course_id).await?;

    tracing::info!(course_id = %course_id, "course deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn ensure_owner_or_admin(
    user: &crate::models::CurrentUser,
    course: &Course,
) -> Result<()> {
    if user.role == UserRole::Admin || user.id == course.instructor_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "only the course owner may modify it".to_string(),
        ))
    }
}
