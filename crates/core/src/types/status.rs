//! Domain enums for users, courses, and payments.

use serde::{Deserialize, Serialize};

/// Account role, assigned at signup and changed only by admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "coursehub.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Can browse, enroll, and track progress.
    #[default]
    Student,
    /// Can author and manage their own courses.
    Instructor,
    /// Full access, including user and course administration.
    Admin,
}

impl UserRole {
    /// Whether this role may author courses.
    #[must_use]
    pub const fn can_author(self) -> bool {
        matches!(self, Self::Instructor | Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Instructor => write!(f, "instructor"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "instructor" => Ok(Self::Instructor),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Course difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "coursehub.course_level", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

impl std::str::FromStr for CourseLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(format!("invalid course level: {s}")),
        }
    }
}

/// Catalog category a course is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "coursehub.course_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CourseCategory {
    Programming,
    Design,
    Business,
    Marketing,
    Photography,
    Music,
    Language,
    Other,
}

impl std::fmt::Display for CourseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Programming => write!(f, "programming"),
            Self::Design => write!(f, "design"),
            Self::Business => write!(f, "business"),
            Self::Marketing => write!(f, "marketing"),
            Self::Photography => write!(f, "photography"),
            Self::Music => write!(f, "music"),
            Self::Language => write!(f, "language"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for CourseCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "programming" => Ok(Self::Programming),
            "design" => Ok(Self::Design),
            "business" => Ok(Self::Business),
            "marketing" => Ok(Self::Marketing),
            "photography" => Ok(Self::Photography),
            "music" => Ok(Self::Music),
            "language" => Ok(Self::Language),
            "other" => Ok(Self::Other),
            _ => Err(format!("invalid course category: {s}")),
        }
    }
}

/// Lifecycle status of a payment record.
///
/// One record exists per gateway checkout session. Transitions move
/// monotonically toward a terminal state, but the row itself is upserted
/// by session id so the gateway's at-least-once delivery reuses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "coursehub.payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Checkout session created, outcome pending.
    #[default]
    Created,
    /// Payment completed; enrollment follows.
    Succeeded,
    /// Payment attempt failed.
    Failed,
    /// Checkout session expired or was canceled.
    Canceled,
}

impl PaymentStatus {
    /// Whether this status is terminal (no further transitions expected).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Created)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}
