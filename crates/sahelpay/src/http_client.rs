use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::api::{
    Customers, PaymentLinks, Payments, Payouts, Plans, Portal, Refunds, Subscriptions, Withdrawals,
};
use crate::config::{validate_base_url, ClientConfig};
use crate::constants::USER_AGENT;
use crate::error::SahelPayError;
use crate::webhook::Webhooks;

/// Authenticated client for the SahelPay REST API.
///
/// Holds one `reqwest::Client` shared by every resource accessor. Requests
/// carry `Authorization: Bearer <secret_key>`; responses are unwrapped from
/// their `{"data": ...}` envelope.
///
/// ```no_run
/// use sahelpay::{ClientConfig, CreatePayment, SahelPayClient};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), sahelpay::SahelPayError> {
/// let client = SahelPayClient::new(ClientConfig::new("sk_test_xxx"))?;
/// let payment = client
///     .payments()
///     .create(CreatePayment::new(5000, "ORANGE_MONEY", "+22370000000"))
///     .await?;
/// println!("{} is {}", payment.reference_id, payment.status.as_str());
/// # Ok(())
/// # }
/// ```
pub struct SahelPayClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
    webhooks: Webhooks,
}

impl SahelPayClient {
    pub fn new(config: ClientConfig) -> Result<Self, SahelPayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| SahelPayError::Config(format!("failed to build HTTP client: {e}")))?;
        Self::with_http_client(config, http)
    }

    /// Create a client with a custom `reqwest::Client`.
    pub fn with_http_client(
        config: ClientConfig,
        http: reqwest::Client,
    ) -> Result<Self, SahelPayError> {
        if config.secret_key.is_empty() {
            return Err(SahelPayError::Config("secret_key is required".to_string()));
        }
        let base_url = validate_base_url(&config.base_url)?;
        Ok(Self {
            http,
            base_url,
            secret_key: config.secret_key,
            webhooks: Webhooks::new(config.webhook_secret),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn payments(&self) -> Payments<'_> {
        Payments::new(self)
    }

    pub fn payment_links(&self) -> PaymentLinks<'_> {
        PaymentLinks::new(self)
    }

    pub fn payouts(&self) -> Payouts<'_> {
        Payouts::new(self)
    }

    pub fn withdrawals(&self) -> Withdrawals<'_> {
        Withdrawals::new(self)
    }

    pub fn plans(&self) -> Plans<'_> {
        Plans::new(self)
    }

    pub fn subscriptions(&self) -> Subscriptions<'_> {
        Subscriptions::new(self)
    }

    pub fn customers(&self) -> Customers<'_> {
        Customers::new(self)
    }

    pub fn portal(&self) -> Portal<'_> {
        Portal::new(self)
    }

    pub fn refunds(&self) -> Refunds<'_> {
        Refunds::new(self)
    }

    /// Webhook helper using `webhook_secret` from the config.
    pub fn webhooks(&self) -> &Webhooks {
        &self.webhooks
    }

    /// Send one request and return the decoded response body.
    ///
    /// The JSON body is only attached to non-GET requests. An empty response
    /// body decodes as `null`.
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, SahelPayError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(method = %method, path = %path, "sahelpay request");

        let mut req = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(&self.secret_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body.filter(|_| method != Method::GET) {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(transport_error)?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            let err = api_error(status, &bytes);
            tracing::warn!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                code = %err.code(),
                "sahelpay request failed"
            );
            return Err(err);
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| SahelPayError::MalformedPayload(format!("invalid response body: {e}")))
    }

    /// Request and unwrap `data`, decoding a missing or null `data` from `{}`.
    pub(crate) async fn data<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, SahelPayError> {
        let resp = self.request(method, path, query, body).await?;
        decode(envelope(resp, Value::Object(Default::default())))
    }

    /// Like [`data`](Self::data) for list endpoints: a missing `data` decodes from `[]`.
    pub(crate) async fn data_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, SahelPayError> {
        let resp = self.request(Method::GET, path, query, None).await?;
        decode(envelope(resp, Value::Array(Vec::new())))
    }
}

impl std::fmt::Debug for SahelPayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SahelPayClient")
            .field("base_url", &self.base_url)
            .field("secret_key", &"[REDACTED]")
            .field("webhooks", &self.webhooks)
            .finish()
    }
}

/// The `data` member of a response envelope, or `fallback` when absent or null.
pub(crate) fn envelope(resp: Value, fallback: Value) -> Value {
    match resp {
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Null) | None => fallback,
            Some(data) => data,
        },
        _ => fallback,
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, SahelPayError> {
    serde_json::from_value(value)
        .map_err(|e| SahelPayError::MalformedPayload(format!("unexpected response shape: {e}")))
}

fn transport_error(e: reqwest::Error) -> SahelPayError {
    let e = e.without_url();
    if e.is_timeout() {
        SahelPayError::Timeout(format!("request timed out: {e}"))
    } else {
        SahelPayError::Network(e.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed {
        message: Option<String>,
        code: Option<String>,
    },
    Message(String),
}

/// Map a non-2xx response onto the error taxonomy.
fn api_error(status: reqwest::StatusCode, body: &[u8]) -> SahelPayError {
    let fallback = format!("HTTP {status}");
    let (message, code) = match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: Some(ErrorBody::Detailed { message, code }),
        }) => (message.unwrap_or(fallback), code),
        Ok(ErrorEnvelope {
            error: Some(ErrorBody::Message(message)),
        }) => (message, None),
        _ => (fallback, None),
    };
    let code = code.unwrap_or_else(|| "API_ERROR".to_string());
    let status = status.as_u16();

    match status {
        401 => SahelPayError::Authentication {
            message,
            code,
            status,
        },
        400 => SahelPayError::Validation { message, code },
        _ => SahelPayError::Api {
            message,
            code,
            status,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn test_error_mapping_by_status() {
        let body = br#"{"error":{"message":"bad key","code":"INVALID_API_KEY"}}"#;
        match api_error(StatusCode::UNAUTHORIZED, body) {
            SahelPayError::Authentication { code, status, .. } => {
                assert_eq!(code, "INVALID_API_KEY");
                assert_eq!(status, 401);
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = api_error(StatusCode::BAD_REQUEST, br#"{"error":{"message":"phone"}}"#);
        assert!(matches!(err, SahelPayError::Validation { .. }));
        assert_eq!(err.code(), "API_ERROR");

        let err = api_error(StatusCode::BAD_GATEWAY, b"<html>oops</html>");
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(err.to_string(), "[API_ERROR] HTTP 502 Bad Gateway");
    }

    #[test]
    fn test_plain_string_error() {
        let err = api_error(StatusCode::NOT_FOUND, br#"{"error":"Payment not found"}"#);
        assert_eq!(err.to_string(), "[API_ERROR] Payment not found");
    }

    #[test]
    fn test_envelope_fallbacks() {
        assert_eq!(envelope(json!({"data": {"a": 1}}), json!({})), json!({"a": 1}));
        assert_eq!(envelope(json!({"success": true}), json!([])), json!([]));
        assert_eq!(envelope(json!({"data": null}), json!({})), json!({}));
        assert_eq!(envelope(Value::Null, json!({})), json!({}));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let err = SahelPayClient::new(ClientConfig::new("")).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = SahelPayClient::new(ClientConfig::new("sk_live_secret")).unwrap();
        assert!(!format!("{client:?}").contains("sk_live_secret"));
    }
}
