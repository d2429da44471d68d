//! Webhook event payloads delivered by the gateway.

use serde::Deserialize;

use super::gateway::CheckoutSession;

/// Event type strings the reconciliation flow cares about.
pub mod event_types {
    /// Buyer completed payment for a checkout session.
    pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
    /// Session expired or was canceled before payment.
    pub const CHECKOUT_EXPIRED: &str = "checkout.session.expired";
    /// An attempted payment failed.
    pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";
}

/// A webhook delivery envelope.
///
/// Unknown event types deserialize fine; the handler acknowledges and
/// ignores them so the gateway doesn't retry forever.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    /// Gateway event id (`evt_...`).
    pub id: String,
    /// Event type string, e.g. `checkout.session.completed`.
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

/// Event payload wrapper.
#[derive(Debug, Deserialize)]
pub struct WebhookData {
    /// The checkout session the event describes.
    pub object: CheckoutSession,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::gateway::SessionStatus;

    #[test]
    fn deserializes_completed_event() {
        let json = r#"{
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_9",
                    "status": "complete",
                    "amount_total": 1500,
                    "currency": "usd",
                    "payment_intent": "pi_4",
                    "customer_email": "buyer@example.com",
                    "metadata": {"course_id": "12", "user_id": "3", "user_email": "buyer@example.com"}
                }
            }
        }"#;

        let event: WebhookEvent = serde_json::from_str(json).expect("deserializes");
        assert_eq!(event.event_type, event_types::CHECKOUT_COMPLETED);
        assert_eq!(event.data.object.status, SessionStatus::Complete);
        assert_eq!(event.data.object.payment_intent.as_deref(), Some("pi_4"));
    }

    #[test]
    fn deserializes_payment_failed_event() {
        let json = r#"{
            "id": "evt_2",
            "type": "payment_intent.payment_failed",
            "data": {
                "object": {
                    "id": "cs_10",
                    "status": "open",
                    "amount_total": 1500,
                    "currency": "usd",
                    "payment_intent": "pi_5",
                    "customer_email": null,
                    "metadata": {"course_id": "12", "user_id": "3", "user_email": "buyer@example.com"}
                }
            }
        }"#;

        let event: WebhookEvent = serde_json::from_str(json).expect("deserializes");
        assert_eq!(event.event_type, event_types::PAYMENT_FAILED);
        assert_eq!(event.data.object.status, SessionStatus::Open);
    }
}
