//! Checkout and payment reconciliation service.
//!
//! Three flows meet here and must agree:
//!
//! 1. **Create** - start a hosted checkout session for a paid course, or
//!    enroll immediately when the course is free.
//! 2. **Verify** - the buyer returned from the gateway; retrieve the
//!    session server-side and reconcile.
//! 3. **Webhook** - the gateway pushed the outcome; reconcile the same way.
//!
//! Verify and webhook can both run, in either order, more than once.
//! Payments are upserted by session id and enrollment is idempotent, so
//! repeating reconciliation is harmless.

use sqlx::PgPool;

use coursehub_core::{CourseId, PaymentStatus, UserId};

use crate::db::courses::CourseRepository;
use crate::db::enrollments::EnrollmentRepository;
use crate::db::payments::{PaymentRecord, PaymentRepository};
use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::payments::{
    CheckoutSession, CheckoutSessionRequest, GatewayClient, SessionMetadata, SessionStatus,
    WebhookEvent, event_types,
};
use crate::services::enrollment::{EnrollSource, EnrollmentService, already_enrolled};

/// Result of starting a checkout.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Course was free; the student is now enrolled.
    Free,
    /// Redirect the buyer to the gateway's hosted page.
    Paid {
        session_id: String,
        checkout_url: String,
    },
}

/// Result of verifying a returned checkout session. Only produced for
/// paid sessions; anything else is an error to the caller.
#[derive(Debug)]
pub struct VerifyOutcome {
    pub course_id: CourseId,
    pub payment_status: PaymentStatus,
    /// True once the enrollment exists (this call or an earlier one).
    pub enrolled: bool,
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    gateway: &'a GatewayClient,
    base_url: &'a str,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, gateway: &'a GatewayClient, base_url: &'a str) -> Self {
        Self {
            pool,
            gateway,
            base_url,
        }
    }

    /// Start checkout for a course.
    ///
    /// Free courses short-circuit: the student is enrolled directly and no
    /// gateway session is created.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for a missing course,
    /// `AppError::Forbidden` for an unpublished one, and
    /// `AppError::BadRequest` when the student is already enrolled.
    pub async fn create(
        &self,
        user_id: UserId,
        user_email: &str,
        course_id: CourseId,
    ) -> Result<CheckoutOutcome, AppError> {
        let course = CourseRepository::new(self.pool)
            .get(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound("course not found".to_string()))?;

        if !course.published {
            return Err(AppError::Forbidden(
                "course is not open for enrollment".to_string(),
            ));
        }

        if EnrollmentRepository::new(self.pool)
            .exists(user_id, course_id)
            .await?
        {
            return Err(already_enrolled());
        }

        if course.price.is_free() {
            EnrollmentService::new(self.pool)
                .enroll(user_id, course_id, EnrollSource::Direct)
                .await?;
            return Ok(CheckoutOutcome::Free);
        }

        let metadata = SessionMetadata {
            course_id,
            user_id: Some(user_id),
            user_email: user_email.to_string(),
        };

        let request = CheckoutSessionRequest {
            amount: course.price.to_minor_units(),
            currency: "usd".to_string(),
            product_name: course.title.clone(),
            customer_email: user_email.to_string(),
            // The gateway substitutes the session id into the placeholder.
            success_url: format!(
                "{}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}",
                self.base_url
            ),
            cancel_url: format!("{}/courses/{course_id}", self.base_url),
            metadata: metadata.to_map(),
        };

        let session = self.gateway.create_checkout_session(&request).await?;

        let checkout_url = session
            .url
            .clone()
            .ok_or_else(|| AppError::Internal("gateway session missing checkout url".to_string()))?;

        PaymentRepository::new(self.pool)
            .upsert_by_session(&payment_record(&session, &metadata, PaymentStatus::Created))
            .await?;

        tracing::info!(
            session_id = %session.id,
            course_id = %course_id,
            user_id = %user_id,
            "checkout session created"
        );

        Ok(CheckoutOutcome::Paid {
            session_id: session.id,
            checkout_url,
        })
    }

    /// Reconcile a checkout session after the buyer returned to the app.
    ///
    /// The session is retrieved from the gateway rather than trusting
    /// anything the client sent beyond the session id. The state the
    /// gateway reports is recorded either way, but only a paid session
    /// verifies.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Gateway` if the session cannot be retrieved and
    /// `AppError::BadRequest` if its metadata doesn't carry the expected
    /// contract or the session was never paid.
    pub async fn verify(
        &self,
        session_id: &str,
        fallback_user: UserId,
    ) -> Result<VerifyOutcome, AppError> {
        let session = self.gateway.retrieve_checkout_session(session_id).await?;
        let metadata = SessionMetadata::from_map(&session.metadata)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let payment_status = status_for(session.status);
        let student_id = metadata.user_id.unwrap_or(fallback_user);

        PaymentRepository::new(self.pool)
            .upsert_by_session(&payment_record(&session, &metadata, payment_status))
            .await?;

        ensure_paid(payment_status)?;

        EnrollmentService::new(self.pool)
            .enroll(student_id, metadata.course_id, EnrollSource::Checkout)
            .await?;

        Ok(VerifyOutcome {
            course_id: metadata.course_id,
            payment_status,
            enrolled: true,
        })
    }

    /// Apply a verified webhook event.
    ///
    /// Unknown event types and events with a broken metadata contract are
    /// acknowledged and logged; retrying them can never succeed, so
    /// erroring would only make the gateway redeliver forever.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if persisting the outcome fails, which
    /// is retryable and should surface as a 5xx.
    pub async fn apply_webhook(&self, event: &WebhookEvent) -> Result<(), AppError> {
        let status = match event.event_type.as_str() {
            event_types::CHECKOUT_COMPLETED => PaymentStatus::Succeeded,
            event_types::CHECKOUT_EXPIRED => PaymentStatus::Canceled,
            event_types::PAYMENT_FAILED => PaymentStatus::Failed,
            other => {
                tracing::debug!(event_id = %event.id, event_type = other, "ignoring webhook event");
                return Ok(());
            }
        };

        let session = &event.data.object;
        let metadata = match SessionMetadata::from_map(&session.metadata) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(
                    event_id = %event.id,
                    session_id = %session.id,
                    error = %e,
                    "webhook session has unusable metadata; acknowledging"
                );
                return Ok(());
            }
        };

        // Course deleted after checkout: the payment rows went with it,
        // and redelivery can't fix that either. Checked before the upsert
        // because a fresh payment row can't reference a missing course.
        let course_exists = CourseRepository::new(self.pool)
            .get(metadata.course_id)
            .await?
            .is_some();
        if !course_exists {
            tracing::warn!(
                event_id = %event.id,
                session_id = %session.id,
                course_id = %metadata.course_id,
                "webhook session references a missing course; acknowledging"
            );
            return Ok(());
        }

        PaymentRepository::new(self.pool)
            .upsert_by_session(&payment_record(session, &metadata, status))
            .await?;

        if status == PaymentStatus::Succeeded {
            match self.resolve_student(&metadata).await? {
                Some(student_id) => {
                    let outcome = EnrollmentService::new(self.pool)
                        .enroll(student_id, metadata.course_id, EnrollSource::Webhook)
                        .await?;
                    tracing::info!(
                        event_id = %event.id,
                        session_id = %session.id,
                        student_id = %student_id,
                        created = outcome.created,
                        "webhook enrollment reconciled"
                    );
                }
                None => {
                    tracing::warn!(
                        event_id = %event.id,
                        session_id = %session.id,
                        "paid session has no resolvable account; payment recorded without enrollment"
                    );
                }
            }
        }

        Ok(())
    }

    /// Resolve the paying student from metadata, falling back to an email
    /// lookup when the session was created without a user id.
    async fn resolve_student(
        &self,
        metadata: &SessionMetadata,
    ) -> Result<Option<UserId>, AppError> {
        if let Some(user_id) = metadata.user_id {
            return Ok(Some(user_id));
        }

        let Ok(email) = coursehub_core::Email::parse(&metadata.user_email) else {
            return Ok(None);
        };

        let user = UserRepository::new(self.pool).get_by_email(&email).await?;
        Ok(user.map(|u| u.id))
    }
}

const fn status_for(status: SessionStatus) -> PaymentStatus {
    match status {
        SessionStatus::Open => PaymentStatus::Created,
        SessionStatus::Complete => PaymentStatus::Succeeded,
        SessionStatus::Expired => PaymentStatus::Canceled,
    }
}

fn ensure_paid(status: PaymentStatus) -> Result<(), AppError> {
    if status == PaymentStatus::Succeeded {
        Ok(())
    } else {
        Err(AppError::BadRequest("payment not completed".to_string()))
    }
}

fn payment_record(
    session: &CheckoutSession,
    metadata: &SessionMetadata,
    status: PaymentStatus,
) -> PaymentRecord {
    PaymentRecord {
        session_id: session.id.clone(),
        course_id: metadata.course_id,
        user_id: metadata.user_id,
        amount: session.amount_total,
        currency: session.currency.clone(),
        status,
        payment_intent_id: session.payment_intent.clone(),
        email: session
            .customer_email
            .clone()
            .unwrap_or_else(|| metadata.user_email.clone()),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use coursehub_core::PaymentStatus;

    use super::{ensure_paid, status_for};
    use crate::payments::SessionStatus;

    #[test]
    fn session_status_maps_to_payment_status() {
        assert_eq!(status_for(SessionStatus::Open), PaymentStatus::Created);
        assert_eq!(status_for(SessionStatus::Complete), PaymentStatus::Succeeded);
        assert_eq!(status_for(SessionStatus::Expired), PaymentStatus::Canceled);
    }

    #[test]
    fn only_a_succeeded_payment_verifies() {
        assert!(ensure_paid(PaymentStatus::Succeeded).is_ok());

        for status in [
            PaymentStatus::Created,
            PaymentStatus::Failed,
            PaymentStatus::Canceled,
        ] {
            let err = ensure_paid(status).expect_err("unpaid session must not verify");
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }
}
