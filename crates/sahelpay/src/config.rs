use std::env;
use std::time::Duration;

use url::Url;

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, DEFAULT_RECONNECT_INTERVAL,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_TIMEOUT_SECS, PRODUCTION_URL, SANDBOX_URL,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

impl From<ConfigError> for crate::SahelPayError {
    fn from(e: ConfigError) -> Self {
        crate::SahelPayError::Config(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_URL,
            Environment::Sandbox => SANDBOX_URL,
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "live" => Ok(Environment::Production),
            "sandbox" | "test" => Ok(Environment::Sandbox),
            _ => Err(ConfigError::InvalidValue {
                name: "SAHELPAY_ENVIRONMENT",
                value: s.to_string(),
            }),
        }
    }
}

/// Settings for the REST client.
#[derive(Clone)]
pub struct ClientConfig {
    /// Secret API key (`sk_live_...` or `sk_test_...`)
    pub secret_key: String,
    /// API base URL without a trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Shared secret for webhook signatures (None = webhooks helper disabled)
    pub webhook_secret: Option<Vec<u8>>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("secret_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Production defaults for the given key.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            base_url: PRODUCTION_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            webhook_secret: None,
        }
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.base_url = environment.base_url().to_string();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn webhook_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let secret_key = env::var("SAHELPAY_SECRET_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingRequired("SAHELPAY_SECRET_KEY"))?;

        // SAHELPAY_BASE_URL wins over SAHELPAY_ENVIRONMENT
        let environment = match env::var("SAHELPAY_ENVIRONMENT") {
            Ok(s) if !s.is_empty() => s.parse()?,
            _ => Environment::default(),
        };
        let base_url = env::var("SAHELPAY_BASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| environment.base_url().to_string());
        let base_url = validate_base_url(&base_url)?;

        let timeout = env_secs("SAHELPAY_TIMEOUT_SECS")?
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let webhook_secret = env::var("SAHELPAY_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .map(String::into_bytes);

        Ok(Self {
            secret_key,
            base_url,
            timeout,
            webhook_secret,
        })
    }
}

/// Settings for the live gateway stream.
#[derive(Clone)]
pub struct StreamConfig {
    /// API base URL without a trailing slash
    pub base_url: String,
    /// Admin token, sent as the `token` query parameter
    pub token: String,
    /// Base delay of the exponential reconnect backoff
    pub reconnect_interval: Duration,
    /// Give up after this many failed reconnects (None = retry forever)
    pub max_reconnect_attempts: Option<u32>,
    /// Time allowed to open the stream
    pub connect_timeout: Duration,
    /// Time allowed between two chunks before the stream is considered dead
    pub read_timeout: Duration,
    /// How long `disconnect()` waits for the background task
    pub shutdown_timeout: Duration,
}

impl std::fmt::Debug for StreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConfig")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("reconnect_interval", &self.reconnect_interval)
            .field("max_reconnect_attempts", &self.max_reconnect_attempts)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}

impl StreamConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            max_reconnect_attempts: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn max_reconnect_attempts(mut self, max: Option<u32>) -> Self {
        self.max_reconnect_attempts = max;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("SAHELPAY_BASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| PRODUCTION_URL.to_string());
        let base_url = validate_base_url(&base_url)?;

        let token = env::var("SAHELPAY_ADMIN_TOKEN")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingRequired("SAHELPAY_ADMIN_TOKEN"))?;

        let mut config = Self::new(base_url, token);

        if let Some(interval) = env_secs("SAHELPAY_RECONNECT_INTERVAL_SECS")? {
            config.reconnect_interval = interval;
        }

        if let Ok(raw) = env::var("SAHELPAY_MAX_RECONNECT_ATTEMPTS") {
            if !raw.is_empty() {
                let max = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    name: "SAHELPAY_MAX_RECONNECT_ATTEMPTS",
                    value: raw.clone(),
                })?;
                config.max_reconnect_attempts = Some(max);
            }
        }

        Ok(config)
    }
}

pub(crate) fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(raw).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(raw.to_string()));
    }
    if parsed.scheme() == "http" {
        tracing::warn!(url = %raw, "base URL does not use HTTPS");
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn env_secs(name: &'static str) -> Result<Option<Duration>, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.is_empty() => raw
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        _ => Ok(None),
    }
}
