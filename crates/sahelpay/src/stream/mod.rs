//! Live gateway-configuration stream.
//!
//! The gateway pushes configuration changes (active gateway switched, provider
//! toggled or put in maintenance, config refreshed) over a Server-Sent-Events
//! endpoint. [`GatewayStream`] keeps that connection open in a background
//! task, decodes `data: <json>` frames into [`GatewayConfigEvent`]s and
//! dispatches them to registered listeners, reconnecting with exponential
//! backoff when the connection fails.

mod client;
mod event;
mod frame;
mod listeners;
mod transport;

pub use client::{reconnect_delay, GatewayStream, StreamState};
pub use event::{GatewayConfigEvent, GatewayEventType};
pub use frame::{parse_frame, FrameDecoder};
pub use listeners::{ListenerError, ListenerRegistry};
pub use transport::{ChunkSource, ReqwestTransport, StreamError, StreamTransport};
