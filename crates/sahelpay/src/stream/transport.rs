//! Streaming HTTP transport used by [`GatewayStream`](super::GatewayStream).
//!
//! The stream client only needs "open a URL, then pull byte chunks until
//! the connection ends". Keeping that behind a trait lets the reconnect state
//! machine run against scripted transports in tests.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use url::Url;

/// Transport-level failure. Never surfaced to callers of the stream client;
/// every variant leads to a reconnect.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("read failed: {0}")]
    Read(String),
    #[error("{0} timed out")]
    Timeout(&'static str),
    #[error("stream closed by server")]
    Closed,
}

/// An open response body yielding raw chunks.
pub trait ChunkSource: Send {
    /// Next chunk, or `None` once the server has closed the stream.
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Bytes>, StreamError>> + Send;
}

/// Opens the event stream.
pub trait StreamTransport: Send + Sync + 'static {
    type Body: ChunkSource + 'static;

    fn open(&self, url: &Url) -> impl Future<Output = Result<Self::Body, StreamError>> + Send;
}

/// Production transport on top of `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with the given connect timeout. Redirects are disabled
    /// so the admin token in the query string is never forwarded elsewhere.
    pub fn new(connect_timeout: Duration) -> Result<Self, StreamError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| StreamError::Connect(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Use a preconfigured `reqwest::Client`.
    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl StreamTransport for ReqwestTransport {
    type Body = reqwest::Response;

    async fn open(&self, url: &Url) -> Result<Self::Body, StreamError> {
        let resp = self
            .http
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| StreamError::Connect(e.without_url().to_string()))?;

        if !resp.status().is_success() {
            return Err(StreamError::Status(resp.status().as_u16()));
        }
        Ok(resp)
    }
}

impl ChunkSource for reqwest::Response {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError> {
        self.chunk()
            .await
            .map_err(|e| StreamError::Read(e.without_url().to_string()))
    }
}
