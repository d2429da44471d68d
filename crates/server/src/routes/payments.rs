//! Checkout and webhook endpoints.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use coursehub_core::{CourseId, PaymentStatus};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::payments::{WebhookEvent, verify_signature};
use crate::services::checkout::{CheckoutOutcome, CheckoutService};
use crate::state::AppState;

/// Header carrying the webhook delivery signature.
pub const SIGNATURE_HEADER: &str = "gateway-signature";

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub course_id: CourseId,
}

#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    pub is_free: bool,
    /// Where to send the buyer: the gateway's hosted page, or straight
    /// back to the course when it was free.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// `POST /api/payments/create-checkout`
///
/// Free courses enroll immediately; paid courses get a hosted checkout
/// session to redirect to.
pub async fn create_checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<Json<CreateCheckoutResponse>> {
    let service = CheckoutService::new(state.pool(), state.gateway(), &state.config().base_url);

    let outcome = service
        .create(user.id, user.email.as_str(), request.course_id)
        .await?;

    let response = match outcome {
        // Nothing to pay for; send the buyer straight back to the course.
        CheckoutOutcome::Free => CreateCheckoutResponse {
            is_free: true,
            checkout_url: Some(format!("/courses/{}?enrolled=true", request.course_id)),
            session_id: None,
        },
        CheckoutOutcome::Paid {
            session_id,
            checkout_url,
        } => CreateCheckoutResponse {
            is_free: false,
            checkout_url: Some(checkout_url),
            session_id: Some(session_id),
        },
    };

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub course_id: CourseId,
    pub payment_status: PaymentStatus,
    pub enrolled: bool,
}

/// `POST /api/payments/verify-payment`
///
/// Called when the buyer lands back on the success page. The outcome is
/// taken from the gateway, never from the client.
pub async fn verify_payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    let service = CheckoutService::new(state.pool(), state.gateway(), &state.config().base_url);

    let outcome = service.verify(&request.session_id, user.id).await?;

    Ok(Json(VerifyResponse {
        course_id: outcome.course_id,
        payment_status: outcome.payment_status,
        enrolled: outcome.enrolled,
    }))
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// `POST /api/payments/webhook`
///
/// The raw body is consumed before any JSON parsing because the
/// signature covers the exact bytes on the wire.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<WebhookAck>)> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing signature header".to_string()))?;

    verify_signature(
        &state.config().gateway.webhook_secret,
        signature,
        &body,
        Utc::now().timestamp(),
    )
    .map_err(|e| AppError::BadRequest(format!("invalid signature: {e}")))?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("malformed event payload: {e}")))?;

    let service = CheckoutService::new(state.pool(), state.gateway(), &state.config().base_url);
    service.apply_webhook(&event).await?;

    Ok((StatusCode::OK, Json(WebhookAck { received: true })))
}
