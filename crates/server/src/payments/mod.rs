//! Payment gateway integration.
//!
//! The gateway is a hosted-checkout provider: we create a checkout session
//! server-side, redirect the buyer to the returned URL, and learn the
//! outcome either by retrieving the session (the verify flow) or from a
//! signed webhook delivery.

pub mod gateway;
pub mod signature;
pub mod webhook;

pub use gateway::{
    CheckoutSession, CheckoutSessionRequest, GatewayClient, GatewayError, SessionMetadata,
    SessionStatus,
};
pub use signature::{SignatureError, verify_signature};
pub use webhook::{WebhookEvent, event_types};
