//! Domain models for the course marketplace.
//!
//! These types represent validated domain objects separate from database
//! row types (which live in the `db` modules).

pub mod course;
pub mod enrollment;
pub mod payment;
pub mod session;
pub mod user;

pub use course::{Course, CourseSummary, Lesson};
pub use enrollment::{Enrollment, LessonProgress, UnknownLesson};
pub use payment::Payment;
pub use session::{CurrentUser, session_keys};
pub use user::User;
