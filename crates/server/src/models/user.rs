//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use coursehub_core::{Email, UserId, UserRole};

/// A marketplace account (domain type).
///
/// The password hash never leaves the `db` layer; this type is safe to
/// serialize into API responses.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique display name chosen at signup.
    pub username: String,
    /// User's email address.
    pub email: Email,
    /// Account role.
    pub role: UserRole,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}
