//! HTTP client for the hosted-checkout payment gateway.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use coursehub_core::{CourseId, UserId};

use crate::config::GatewayConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from gateway API calls.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure (connect, timeout, decode).
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned a non-success status.
    #[error("gateway returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Session metadata is missing or malformed.
    #[error("invalid session metadata: {0}")]
    InvalidMetadata(String),
}

/// Checkout session lifecycle as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Buyer has not completed payment.
    Open,
    /// Payment completed successfully.
    Complete,
    /// Session expired or was canceled before payment.
    Expired,
}

/// A checkout session as represented by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Gateway session id (`cs_...`).
    pub id: String,
    /// Hosted checkout URL to redirect the buyer to. Absent once the
    /// session is no longer open.
    #[serde(default)]
    pub url: Option<String>,
    pub status: SessionStatus,
    /// Amount in minor units.
    pub amount_total: i64,
    /// Lowercase ISO currency code.
    pub currency: String,
    /// Payment intent id (`pi_...`), present once payment was attempted.
    #[serde(default)]
    pub payment_intent: Option<String>,
    /// Buyer email as collected by the gateway.
    #[serde(default)]
    pub customer_email: Option<String>,
    /// String-valued metadata echoed back from session creation.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Fields for creating a checkout session.
#[derive(Debug, Serialize)]
pub struct CheckoutSessionRequest {
    /// Amount in minor units.
    pub amount: i64,
    /// Lowercase ISO currency code.
    pub currency: String,
    /// Line-item name shown on the hosted page.
    pub product_name: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,
}

/// The metadata contract between checkout creation and reconciliation.
///
/// Gateway metadata is string-valued, so ids round-trip through their
/// `Display`/`FromStr` forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetadata {
    pub course_id: CourseId,
    pub user_id: Option<UserId>,
    pub user_email: String,
}

impl SessionMetadata {
    const COURSE_ID: &'static str = "course_id";
    const USER_ID: &'static str = "user_id";
    const USER_EMAIL: &'static str = "user_email";

    /// Render into the string map sent to the gateway.
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(Self::COURSE_ID.to_owned(), self.course_id.to_string());
        if let Some(user_id) = self.user_id {
            map.insert(Self::USER_ID.to_owned(), user_id.to_string());
        }
        map.insert(Self::USER_EMAIL.to_owned(), self.user_email.clone());
        map
    }

    /// Parse back from a gateway metadata map.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidMetadata` if required keys are
    /// missing or unparseable.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, GatewayError> {
        let course_id = map
            .get(Self::COURSE_ID)
            .ok_or_else(|| GatewayError::InvalidMetadata("missing course_id".to_owned()))?
            .parse::<CourseId>()
            .map_err(|_| GatewayError::InvalidMetadata("unparseable course_id".to_owned()))?;

        let user_id = map
            .get(Self::USER_ID)
            .map(|raw| {
                raw.parse::<UserId>()
                    .map_err(|_| GatewayError::InvalidMetadata("unparseable user_id".to_owned()))
            })
            .transpose()?;

        let user_email = map
            .get(Self::USER_EMAIL)
            .cloned()
            .ok_or_else(|| GatewayError::InvalidMetadata("missing user_email".to_owned()))?;

        Ok(Self {
            course_id,
            user_id,
            user_email,
        })
    }
}

/// Client for the gateway's REST API.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    api_url: String,
    secret_key: SecretString,
}

impl GatewayClient {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Http` if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            secret_key: config.secret_key.clone(),
        })
    }

    /// Create a hosted checkout session.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request fails or the gateway rejects it.
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_url))
            .bearer_auth(self.secret_key.expose_secret())
            .json(request)
            .send()
            .await?;

        Self::parse_session(response).await
    }

    /// Retrieve a checkout session by id.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request fails or the gateway rejects it.
    pub async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, GatewayError> {
        let response = self
            .http
            .get(format!("{}/v1/checkout/sessions/{session_id}", self.api_url))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        Self::parse_session(response).await
    }

    async fn parse_session(response: reqwest::Response) -> Result<CheckoutSession, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("api_url", &self.api_url)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_round_trips() {
        let metadata = SessionMetadata {
            course_id: CourseId::new(42),
            user_id: Some(UserId::new(7)),
            user_email: "student@example.com".to_owned(),
        };

        let parsed = SessionMetadata::from_map(&metadata.to_map()).expect("parses");
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn metadata_user_id_is_optional() {
        let metadata = SessionMetadata {
            course_id: CourseId::new(3),
            user_id: None,
            user_email: "guest@example.com".to_owned(),
        };

        let map = metadata.to_map();
        assert!(!map.contains_key("user_id"));

        let parsed = SessionMetadata::from_map(&map).expect("parses");
        assert_eq!(parsed.user_id, None);
    }

    #[test]
    fn metadata_missing_course_id_is_rejected() {
        let mut map = HashMap::new();
        map.insert("user_email".to_owned(), "a@b.co".to_owned());

        assert!(SessionMetadata::from_map(&map).is_err());
    }

    #[test]
    fn session_deserializes_gateway_payload() {
        let json = r#"{
            "id": "cs_test_123",
            "url": "https://checkout.gateway.test/cs_test_123",
            "status": "open",
            "amount_total": 4999,
            "currency": "usd",
            "metadata": {"course_id": "1", "user_email": "s@example.com"}
        }"#;

        let session: CheckoutSession = serde_json::from_str(json).expect("deserializes");
        assert_eq!(session.status, SessionStatus::Open);
        assert_eq!(session.amount_total, 4999);
        assert!(session.payment_intent.is_none());
    }
}
