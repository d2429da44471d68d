//! Payment repository for database operations.
//!
//! Payment rows are keyed by the gateway checkout session id and written
//! with an upsert: the gateway delivers webhooks at least once, and the
//! verify endpoint can race the webhook, so every write path must land on
//! the same row.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use coursehub_core::{CourseId, PaymentId, PaymentStatus, UserId};

use super::RepositoryError;
use crate::models::Payment;

/// Raw `payments` row.
#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: PaymentId,
    user_id: Option<UserId>,
    course_id: CourseId,
    amount: i64,
    currency: String,
    status: PaymentStatus,
    session_id: String,
    payment_intent_id: Option<String>,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            course_id: row.course_id,
            amount: row.amount,
            currency: row.currency,
            status: row.status,
            session_id: row.session_id,
            payment_intent_id: row.payment_intent_id,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PAYMENT_COLUMNS: &str = "id, user_id, course_id, amount, currency, status, session_id, \
     payment_intent_id, email, created_at, updated_at";

/// Fields recorded for a checkout session.
#[derive(Debug)]
pub struct PaymentRecord {
    pub session_id: String,
    pub course_id: CourseId,
    pub user_id: Option<UserId>,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub email: String,
}

/// Repository for payment database operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or update the payment row for a checkout session.
    ///
    /// On conflict the status, intent id, and user id are refreshed;
    /// `user_id` keeps its existing value if the new one is absent, so a
    /// later anonymous webhook cannot erase identity resolved earlier.
    /// A `succeeded` status is sticky: webhooks arrive out of order, and a
    /// late `expired` delivery must not unwind a recorded sale.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn upsert_by_session(
        &self,
        record: &PaymentRecord,
    ) -> Result<Payment, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "INSERT INTO coursehub.payments
                 (session_id, course_id, user_id, amount, currency, status,
                  payment_intent_id, email)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (session_id) DO UPDATE
             SET status = CASE
                     WHEN coursehub.payments.status = 'succeeded'
                         THEN coursehub.payments.status
                     ELSE EXCLUDED.status
                 END,
                 payment_intent_id = COALESCE(EXCLUDED.payment_intent_id,
                                              coursehub.payments.payment_intent_id),
                 user_id = COALESCE(EXCLUDED.user_id, coursehub.payments.user_id),
                 updated_at = now()
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(&record.session_id)
        .bind(record.course_id)
        .bind(record.user_id)
        .bind(record.amount)
        .bind(&record.currency)
        .bind(record.status)
        .bind(&record.payment_intent_id)
        .bind(&record.email)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get the payment for a checkout session, if recorded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM coursehub.payments WHERE session_id = $1"
        ))
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Payment::from))
    }
}
