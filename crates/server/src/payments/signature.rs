//! Webhook delivery signature verification.
//!
//! Deliveries carry a signature header of the form:
//!
//! ```text
//! t=<unix seconds>,v1=<hex hmac-sha256>
//! ```
//!
//! The MAC is computed over `"{timestamp}.{raw body}"` with the webhook
//! signing secret, which binds the signature to both the payload and the
//! delivery time. Deliveries older than [`TOLERANCE_SECONDS`] are rejected
//! even with a valid MAC, so a captured delivery cannot be replayed later.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age of a delivery, in seconds.
pub const TOLERANCE_SECONDS: i64 = 300;

/// Signature verification failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// Header is missing the `t=` timestamp element.
    #[error("signature header missing timestamp")]
    MissingTimestamp,

    /// Header is missing any `v1=` signature element.
    #[error("signature header missing signature")]
    MissingSignature,

    /// Timestamp element is not a valid integer.
    #[error("signature header has malformed timestamp")]
    MalformedTimestamp,

    /// Delivery is older than the replay tolerance.
    #[error("signature timestamp outside tolerance")]
    TimestampOutOfTolerance,

    /// No `v1` element matched the expected MAC.
    #[error("signature mismatch")]
    Mismatch,
}

/// Verify a webhook delivery signature.
///
/// `now` is the verifier's current Unix time; it is a parameter so the
/// tolerance window is testable.
///
/// # Errors
///
/// Returns a [`SignatureError`] describing why verification failed.
pub fn verify_signature(
    secret: &SecretString,
    header: &str,
    payload: &[u8],
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<&str> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for element in header.split(',') {
        match element.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if candidates.is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::MalformedTimestamp)?;
    if (now - ts).abs() > TOLERANCE_SECONDS {
        return Err(SignatureError::TimestampOutOfTolerance);
    }

    // HMAC over "{timestamp}.{body}"; comparison inside verify_slice is
    // constant-time.
    for candidate in candidates {
        let Ok(raw) = hex::decode(candidate) else {
            continue;
        };

        let mut mac = mac_for(secret);
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        if mac.verify_slice(&raw).is_ok() {
            return Ok(());
        }
    }

    Err(SignatureError::Mismatch)
}

fn mac_for(secret: &SecretString) -> HmacSha256 {
    // HMAC accepts keys of any size, so this cannot fail.
    #[allow(clippy::expect_used)]
    HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts any key size")
}

/// Compute the signature header for a payload. Test and tooling helper.
#[must_use]
pub fn sign(secret: &SecretString, payload: &[u8], timestamp: i64) -> String {
    let mut mac = mac_for(secret);
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let hex_mac = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={hex_mac}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("whsec_9f8e7d6c5b4a")
    }

    const NOW: i64 = 1_756_000_000;

    #[test]
    fn accepts_valid_signature() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = sign(&secret(), payload, NOW);

        assert_eq!(verify_signature(&secret(), &header, payload, NOW), Ok(()));
    }

    #[test]
    fn accepts_delivery_within_tolerance() {
        let payload = b"{}";
        let header = sign(&secret(), payload, NOW - 200);

        assert_eq!(verify_signature(&secret(), &header, payload, NOW), Ok(()));
    }

    #[test]
    fn rejects_wrong_secret() {
        let payload = b"{}";
        let header = sign(&SecretString::from("other_key_entirely"), payload, NOW);

        assert_eq!(
            verify_signature(&secret(), &header, payload, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_modified_payload() {
        let header = sign(&secret(), b"{\"amount\":100}", NOW);

        assert_eq!(
            verify_signature(&secret(), &header, b"{\"amount\":999}", NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_stale_delivery() {
        let payload = b"{}";
        let header = sign(&secret(), payload, NOW - 600);

        assert_eq!(
            verify_signature(&secret(), &header, payload, NOW),
            Err(SignatureError::TimestampOutOfTolerance)
        );
    }

    #[test]
    fn rejects_missing_timestamp() {
        assert_eq!(
            verify_signature(&secret(), "v1=deadbeef", b"{}", NOW),
            Err(SignatureError::MissingTimestamp)
        );
    }

    #[test]
    fn rejects_missing_signature() {
        assert_eq!(
            verify_signature(&secret(), "t=1234567890", b"{}", NOW),
            Err(SignatureError::MissingSignature)
        );
    }

    #[test]
    fn rejects_garbage_header() {
        assert_eq!(
            verify_signature(&secret(), "garbage", b"{}", NOW),
            Err(SignatureError::MissingTimestamp)
        );
    }

    #[test]
    fn accepts_when_any_v1_element_matches() {
        let payload = b"{}";
        let good = sign(&secret(), payload, NOW);
        // Gateways send multiple v1 elements during secret rotation.
        let header = format!("t={NOW},v1=00ff00ff,{}", good.split_once(',').map_or("", |(_, rest)| rest));

        assert_eq!(verify_signature(&secret(), &header, payload, NOW), Ok(()));
    }
}
