use thiserror::Error;

/// Errors returned by SahelPay operations.
///
/// Every variant maps to a stable machine-readable [`code`](SahelPayError::code)
/// so integrations can branch on the category without matching on messages.
#[derive(Debug, Error)]
pub enum SahelPayError {
    #[error("[INVALID_SIGNATURE] invalid webhook signature")]
    InvalidSignature,

    #[error("[MALFORMED_PAYLOAD] {0}")]
    MalformedPayload(String),

    #[error("[{code}] {method} does not support {capability}: {justification}")]
    CapabilityNotSupported {
        method: String,
        capability: String,
        justification: String,
        code: &'static str,
    },

    #[error("[{code}] {message}")]
    Validation { message: String, code: String },

    #[error("[{code}] {message}")]
    Authentication {
        message: String,
        code: String,
        status: u16,
    },

    #[error("[{code}] {message}")]
    Api {
        message: String,
        code: String,
        status: u16,
    },

    #[error("[NETWORK_ERROR] network error: {0}")]
    Network(String),

    #[error("[TIMEOUT] {0}")]
    Timeout(String),

    #[error("config error: {0}")]
    Config(String),
}

impl SahelPayError {
    /// Stable error code, e.g. `INVALID_SIGNATURE` or the `code` returned by the API.
    pub fn code(&self) -> &str {
        match self {
            SahelPayError::InvalidSignature => "INVALID_SIGNATURE",
            SahelPayError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            SahelPayError::CapabilityNotSupported { code, .. } => code,
            SahelPayError::Validation { code, .. }
            | SahelPayError::Authentication { code, .. }
            | SahelPayError::Api { code, .. } => code,
            SahelPayError::Network(_) => "NETWORK_ERROR",
            SahelPayError::Timeout(_) => "TIMEOUT",
            SahelPayError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// HTTP status associated with the error, when one exists.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SahelPayError::Validation { .. } => Some(400),
            SahelPayError::Authentication { status, .. } | SahelPayError::Api { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub(crate) fn validation(message: impl Into<String>, code: impl Into<String>) -> Self {
        SahelPayError::Validation {
            message: message.into(),
            code: code.into(),
        }
    }
}

pub type Result<T, E = SahelPayError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(SahelPayError::InvalidSignature.code(), "INVALID_SIGNATURE");
        assert_eq!(
            SahelPayError::MalformedPayload("x".into()).code(),
            "MALFORMED_PAYLOAD"
        );
        assert_eq!(SahelPayError::Network("down".into()).code(), "NETWORK_ERROR");
    }

    #[test]
    fn api_errors_carry_status() {
        let err = SahelPayError::Authentication {
            message: "bad key".into(),
            code: "UNAUTHORIZED".into(),
            status: 401,
        };
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(err.to_string(), "[UNAUTHORIZED] bad key");
        assert_eq!(SahelPayError::InvalidSignature.status_code(), None);
    }
}
