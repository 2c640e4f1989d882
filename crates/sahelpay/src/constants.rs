use std::time::Duration;

/// Production API.
pub const PRODUCTION_URL: &str = "https://api.sahelpay.ml";

/// Sandbox API for `sk_test_` keys.
pub const SANDBOX_URL: &str = "https://sandbox.sahelpay.ml";

/// Default REST request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Sent as `User-Agent` on every REST request.
pub const USER_AGENT: &str = concat!("SahelPay-Rust/", env!("CARGO_PKG_VERSION"));

/// Path of the admin gateway-configuration event stream.
pub const GATEWAY_STREAM_PATH: &str = "/admin/gateways/stream";

pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Upper bound of the reconnect backoff.
pub const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Largest incomplete stream frame kept in memory, in bytes.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Payout bounds, in XOF.
pub const MIN_PAYOUT_AMOUNT: i64 = 100;
pub const MAX_PAYOUT_AMOUNT: i64 = 5_000_000;

/// Providers for which a payment is a card payment unless told otherwise.
pub const CARD_PROVIDERS: [&str; 5] = ["CARD", "CINETPAY", "GIM_UEMOA", "VISA", "MASTERCARD"];
