//! SahelPay Mobile-Money SDK.
//!
//! Client library for the SahelPay payment gateway (Orange Money, Wave, Moov
//! and card payments across the UEMOA zone).
//!
//! # Components
//!
//! - **Webhooks** ([`parse_event`], [`verify_signature`]): HMAC-SHA-256
//!   verification of `X-SahelPay-Signature` and decoding into typed events
//! - **Gateway stream** ([`GatewayStream`]): self-reconnecting SSE client for
//!   live gateway configuration changes
//! - **Capabilities** ([`has_capability`], [`require_capability`]): static
//!   matrix of what each payment method supports
//! - **REST client** ([`SahelPayClient`]): payments, payment links, payouts,
//!   withdrawals, billing and refunds
//!
//! # Verifying a webhook
//!
//! ```
//! use sahelpay::{compute_signature, parse_event, WebhookPayload};
//!
//! let body = r#"{"event":"payment.success","data":{"id":"pay_1","amount":5000,"status":"SUCCESS"}}"#;
//! let signature = compute_signature(body, "whsec_test");
//!
//! let event = parse_event(body, &signature, "whsec_test").unwrap();
//! match event.data {
//!     WebhookPayload::Payment(payment) => assert!(payment.is_successful()),
//!     _ => unreachable!(),
//! }
//! ```

// Core
pub mod capabilities;
pub mod constants;
pub mod error;
pub mod hmac;
pub mod resources;
pub mod webhook;

// Live gateway configuration
pub mod stream;

// REST API
pub mod api;
pub mod config;
pub mod http_client;

// Re-exports
pub use api::{
    CreateCustomer, CreatePayment, CreatePaymentLink, CreatePayout, CreatePlan,
    CreatePortalSession, CreateRefund, CreateSubscription, CreateWithdrawal, ListPayments,
    ListPayouts, Page, PollOptions, StatusCheck, UpdateCustomer,
};
pub use capabilities::{
    get_capabilities, has_capability, justification, methods_with_capability, require_capability,
    Capability, CapabilitySet, PaymentMethod, CAPABILITY_MATRIX_VERSION,
};
pub use config::{ClientConfig, ConfigError, Environment, StreamConfig};
pub use error::{Result, SahelPayError};
pub use crate::hmac::{compute_signature, verify_signature};
pub use http_client::SahelPayClient;
pub use resources::{Payment, PaymentLink, Payout, PayoutStats, Refund, TransactionStatus};
pub use stream::{
    reconnect_delay, GatewayConfigEvent, GatewayEventType, GatewayStream, StreamState,
};
pub use webhook::{parse_event, WebhookEvent, WebhookPayload, Webhooks, SIGNATURE_HEADER};
