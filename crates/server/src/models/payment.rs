//! Payment domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use coursehub_core::{CourseId, PaymentId, PaymentStatus, UserId};

/// A payment record, one per gateway checkout session.
///
/// Rows are upserted by `session_id`, so the gateway's at-least-once
/// webhook delivery converges onto a single record per session.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    /// Unique payment ID.
    pub id: PaymentId,
    /// Paying user; may be unset until reconciliation resolves identity.
    pub user_id: Option<UserId>,
    /// Course being purchased.
    pub course_id: CourseId,
    /// Amount in minor units (cents).
    pub amount: i64,
    /// Lowercase ISO currency code (e.g., "usd").
    pub currency: String,
    /// Lifecycle status.
    pub status: PaymentStatus,
    /// Gateway checkout session id (unique key).
    pub session_id: String,
    /// Gateway payment intent id, once known.
    pub payment_intent_id: Option<String>,
    /// Payer email.
    pub email: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}
