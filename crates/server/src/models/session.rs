//! Session-stored identity.

use serde::{Deserialize, Serialize};

use coursehub_core::{Email, UserId, UserRole};

/// Keys used to store data in the session.
pub mod session_keys {
    /// Key for the authenticated user.
    pub const CURRENT_USER: &str = "current_user";
}

/// The authenticated user, as stored in the session cookie's server-side
/// record after login.
///
/// Handlers receive this via the `RequireAuth`/`OptionalAuth` extractors
/// and pass it explicitly into service calls; there is no ambient
/// per-request identity lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// The user's ID.
    pub id: UserId,
    /// Display name.
    pub username: String,
    /// Email address.
    pub email: Email,
    /// Account role, checked by the role-gated extractors.
    pub role: UserRole,
}

impl CurrentUser {
    /// Build the session identity from a full user record.
    #[must_use]
    pub fn from_user(user: &crate::models::User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
