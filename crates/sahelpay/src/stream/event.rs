use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// Category of a gateway configuration event.
///
/// Selected from the `type` field of the decoded object; missing or
/// unrecognised types map to [`GatewayEventType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GatewayEventType {
    /// Synthesised locally each time the stream (re)opens.
    #[serde(rename = "connected")]
    Connected,
    #[serde(rename = "heartbeat")]
    Heartbeat,
    #[serde(rename = "gateway.switched")]
    GatewaySwitched,
    #[serde(rename = "provider.toggled")]
    ProviderToggled,
    #[serde(rename = "provider.maintenance")]
    ProviderMaintenance,
    #[serde(rename = "config.refreshed")]
    ConfigRefreshed,
    #[serde(rename = "unknown")]
    Unknown,
}

impl GatewayEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayEventType::Connected => "connected",
            GatewayEventType::Heartbeat => "heartbeat",
            GatewayEventType::GatewaySwitched => "gateway.switched",
            GatewayEventType::ProviderToggled => "provider.toggled",
            GatewayEventType::ProviderMaintenance => "provider.maintenance",
            GatewayEventType::ConfigRefreshed => "config.refreshed",
            GatewayEventType::Unknown => "unknown",
        }
    }
}

impl From<&str> for GatewayEventType {
    fn from(s: &str) -> Self {
        match s {
            "connected" => GatewayEventType::Connected,
            "heartbeat" => GatewayEventType::Heartbeat,
            "gateway.switched" => GatewayEventType::GatewaySwitched,
            "provider.toggled" => GatewayEventType::ProviderToggled,
            "provider.maintenance" => GatewayEventType::ProviderMaintenance,
            "config.refreshed" => GatewayEventType::ConfigRefreshed,
            _ => GatewayEventType::Unknown,
        }
    }
}

impl fmt::Display for GatewayEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event received on the gateway stream.
///
/// `payload` is the full decoded object, `type` field included.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfigEvent {
    pub kind: GatewayEventType,
    pub payload: Map<String, Value>,
}

impl GatewayConfigEvent {
    pub fn from_object(payload: Map<String, Value>) -> Self {
        let kind = payload
            .get("type")
            .and_then(Value::as_str)
            .map(GatewayEventType::from)
            .unwrap_or(GatewayEventType::Unknown);
        Self { kind, payload }
    }

    /// The local `connected` signal sent when a connection opens.
    pub(crate) fn connected_now() -> Self {
        let mut payload = Map::new();
        payload.insert("type".into(), Value::from("connected"));
        payload.insert(
            "timestamp".into(),
            Value::from(
                chrono::Utc::now()
                    .format("%Y-%m-%dT%H:%M:%SZ")
                    .to_string(),
            ),
        );
        Self {
            kind: GatewayEventType::Connected,
            payload,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// The `type` string as sent, which may be more specific than `kind`.
    pub fn type_name(&self) -> &str {
        self.payload
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.payload.get("timestamp").and_then(Value::as_str)
    }

    /// The nested `data` object, if the server sent one.
    pub fn data(&self) -> Option<&Value> {
        self.payload.get("data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_kind_from_type_field() {
        let evt = GatewayConfigEvent::from_object(object(json!({"type": "provider.toggled"})));
        assert_eq!(evt.kind, GatewayEventType::ProviderToggled);
    }

    #[test]
    fn test_missing_or_odd_type_is_unknown() {
        let evt = GatewayConfigEvent::from_object(object(json!({"x": 1})));
        assert_eq!(evt.kind, GatewayEventType::Unknown);
        assert_eq!(evt.type_name(), "unknown");

        let evt = GatewayConfigEvent::from_object(object(json!({"type": "fee.updated"})));
        assert_eq!(evt.kind, GatewayEventType::Unknown);
        assert_eq!(evt.type_name(), "fee.updated");
    }

    #[test]
    fn test_connected_event_has_utc_timestamp() {
        let evt = GatewayConfigEvent::connected_now();
        assert_eq!(evt.kind, GatewayEventType::Connected);
        let ts = evt.timestamp().unwrap();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
