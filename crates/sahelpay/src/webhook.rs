//! Webhook verification and event decoding.
//!
//! SahelPay signs every webhook body with HMAC-SHA256 using the merchant's
//! webhook secret and sends the hex digest in [`SIGNATURE_HEADER`]. Bodies
//! look like:
//!
//! ```json
//! {"event": "payout.failed", "data": {...}, "timestamp": "2024-06-01T10:00:00Z"}
//! ```
//!
//! The payload type is chosen by substring match on `event`: anything
//! mentioning `payout` is a [`Payout`], anything mentioning `refund` a
//! [`Refund`], and everything else, including events this SDK has never seen,
//! is decoded as a [`Payment`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SahelPayError;
use crate::hmac::verify_signature;
use crate::resources::{Payment, Payout, Refund};

/// Header carrying the hex HMAC-SHA256 of the raw body.
pub const SIGNATURE_HEADER: &str = "X-SahelPay-Signature";

/// Decoded `data` of a webhook event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WebhookPayload {
    Payment(Payment),
    Payout(Payout),
    Refund(Refund),
}

impl WebhookPayload {
    pub fn as_payment(&self) -> Option<&Payment> {
        match self {
            WebhookPayload::Payment(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_payout(&self) -> Option<&Payout> {
        match self {
            WebhookPayload::Payout(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_refund(&self) -> Option<&Refund> {
        match self {
            WebhookPayload::Refund(r) => Some(r),
            _ => None,
        }
    }
}

/// A verified webhook event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookEvent {
    /// Namespaced event name, e.g. `payment.success`.
    pub event: String,
    pub data: WebhookPayload,
    /// ISO-8601 timestamp as sent by the gateway; empty when absent.
    pub timestamp: String,
}

impl WebhookEvent {
    /// Whether `event` belongs to a namespace this SDK knows how to type.
    ///
    /// Unrecognised events are still decoded as payments for compatibility;
    /// this lets a handler tell the two cases apart.
    pub fn is_recognized(&self) -> bool {
        ["payment", "payout", "refund"]
            .iter()
            .any(|ns| self.event.contains(ns))
    }
}

#[derive(Deserialize)]
struct Envelope {
    event: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Verify `signature` over `payload` and decode the event.
///
/// Fails with [`SahelPayError::InvalidSignature`] before looking at the body
/// if the signature does not match, and with
/// [`SahelPayError::MalformedPayload`] if the body is not a JSON object with
/// a string `event` field or its `data` does not fit the selected record.
pub fn parse_event(
    payload: impl AsRef<[u8]>,
    signature: &str,
    secret: impl AsRef<[u8]>,
) -> Result<WebhookEvent, SahelPayError> {
    let payload = payload.as_ref();
    if !verify_signature(payload, signature, secret) {
        tracing::warn!(len = payload.len(), "rejected webhook with invalid signature");
        return Err(SahelPayError::InvalidSignature);
    }

    let envelope: Envelope = serde_json::from_slice(payload)
        .map_err(|e| SahelPayError::MalformedPayload(format!("invalid JSON body: {e}")))?;

    let event = match envelope.event {
        Some(Value::String(event)) => event,
        Some(other) => {
            return Err(SahelPayError::MalformedPayload(format!(
                "`event` must be a string, got {other}"
            )))
        }
        None => {
            return Err(SahelPayError::MalformedPayload(
                "missing `event` field".to_string(),
            ))
        }
    };

    let data = match envelope.data {
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(data) => data,
    };

    let decoded = decode_payload(&event, data)
        .map_err(|e| SahelPayError::MalformedPayload(format!("invalid `data` for {event}: {e}")))?;

    tracing::debug!(event = %event, "verified webhook event");

    Ok(WebhookEvent {
        event,
        data: decoded,
        timestamp: envelope.timestamp.unwrap_or_default(),
    })
}

fn decode_payload(event: &str, data: Value) -> Result<WebhookPayload, serde_json::Error> {
    if event.contains("payout") {
        serde_json::from_value(data).map(WebhookPayload::Payout)
    } else if event.contains("refund") {
        serde_json::from_value(data).map(WebhookPayload::Refund)
    } else {
        serde_json::from_value(data).map(WebhookPayload::Payment)
    }
}

/// Webhook helper bound to a configured secret.
///
/// Obtained from [`crate::SahelPayClient::webhooks`]; the free functions in
/// this module work without a client.
#[derive(Clone)]
pub struct Webhooks {
    secret: Option<Vec<u8>>,
}

impl std::fmt::Debug for Webhooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Webhooks")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Webhooks {
    pub fn new(secret: Option<Vec<u8>>) -> Self {
        Self { secret }
    }

    fn secret(&self) -> Result<&[u8], SahelPayError> {
        self.secret
            .as_deref()
            .ok_or_else(|| SahelPayError::Config("no webhook secret configured".to_string()))
    }

    /// Verify with the configured secret. `false` when no secret is configured.
    pub fn verify(&self, payload: impl AsRef<[u8]>, signature: &str) -> bool {
        match self.secret() {
            Ok(secret) => verify_signature(payload, signature, secret),
            Err(_) => false,
        }
    }

    /// Verify and decode with the configured secret.
    pub fn parse(
        &self,
        payload: impl AsRef<[u8]>,
        signature: &str,
    ) -> Result<WebhookEvent, SahelPayError> {
        parse_event(payload, signature, self.secret()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmac::compute_signature;

    const SECRET: &str = "whsec_test";

    fn signed(body: &str) -> (String, String) {
        (body.to_string(), compute_signature(body, SECRET))
    }

    #[test]
    fn test_invalid_signature_is_rejected_before_parsing() {
        let err = parse_event("not even json", "00", SECRET).unwrap_err();
        assert!(matches!(err, SahelPayError::InvalidSignature));
    }

    #[test]
    fn test_missing_event_is_malformed() {
        let (body, sig) = signed(r#"{"data":{}}"#);
        let err = parse_event(&body, &sig, SECRET).unwrap_err();
        assert!(matches!(err, SahelPayError::MalformedPayload(_)));
    }

    #[test]
    fn test_non_json_is_malformed() {
        let (body, sig) = signed("<html>");
        let err = parse_event(&body, &sig, SECRET).unwrap_err();
        assert_eq!(err.code(), "MALFORMED_PAYLOAD");
    }

    #[test]
    fn test_missing_data_decodes_default_payment() {
        let (body, sig) = signed(r#"{"event":"payment.pending"}"#);
        let evt = parse_event(&body, &sig, SECRET).unwrap();
        let payment = evt.data.as_payment().unwrap();
        assert!(payment.is_pending());
        assert_eq!(evt.timestamp, "");
    }

    #[test]
    fn test_is_recognized() {
        let (body, sig) = signed(r#"{"event":"merchant.verified","data":{}}"#);
        let evt = parse_event(&body, &sig, SECRET).unwrap();
        assert!(!evt.is_recognized());
        assert!(evt.data.as_payment().is_some());
    }

    #[test]
    fn test_webhooks_without_secret() {
        let hooks = Webhooks::new(None);
        assert!(!hooks.verify("{}", "abc"));
        assert_eq!(hooks.parse("{}", "abc").unwrap_err().code(), "CONFIG_ERROR");
    }
}
