//! SSE framing: `data: <json>` lines grouped into blank-line-terminated frames.

use serde_json::Value;

use super::event::GatewayConfigEvent;
use crate::constants::MAX_FRAME_SIZE;

const DATA_PREFIX: &str = "data: ";

/// Accumulates raw transport bytes and yields decoded events frame by frame.
///
/// Chunks may split a frame, a line, or a UTF-8 sequence anywhere; nothing is
/// decoded until the frame terminator has been seen. An incomplete frame
/// larger than [`MAX_FRAME_SIZE`] is discarded up to its terminator.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    /// Bytes of `buf` already searched for a terminator.
    scanned: usize,
    /// Inside an oversized frame whose head was dropped.
    discarding: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return the events of every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<GatewayConfigEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        loop {
            // A terminator is at most 3 bytes, so one may straddle the
            // previous end of the buffer.
            let start = self.scanned.saturating_sub(2);
            let Some((end, terminator_len)) = find_terminator(&self.buf[start..]) else {
                self.scanned = self.buf.len();
                break;
            };
            let end = start + end;
            let frame: Vec<u8> = self.buf.drain(..end + terminator_len).collect();
            self.scanned = 0;

            if std::mem::take(&mut self.discarding) {
                continue;
            }
            match std::str::from_utf8(&frame[..end]) {
                Ok(text) => events.extend(parse_frame(text)),
                Err(e) => tracing::debug!(error = %e, "dropping non UTF-8 frame"),
            }
        }

        if self.buf.len() > MAX_FRAME_SIZE {
            tracing::debug!(
                pending = self.buf.len(),
                limit = MAX_FRAME_SIZE,
                "dropping oversized stream frame"
            );
            self.clear();
            self.discarding = true;
        }
        events
    }

    /// Bytes of the incomplete trailing frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.scanned = 0;
        self.discarding = false;
    }
}

/// Position and length of the first blank-line terminator (`\n\n` or `\n\r\n`).
fn find_terminator(buf: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i + 1 < buf.len() {
        if buf[i] == b'\n' {
            if buf[i + 1] == b'\n' {
                return Some((i, 2));
            }
            if buf[i + 1] == b'\r' && buf.get(i + 2) == Some(&b'\n') {
                return Some((i, 3));
            }
        }
        i += 1;
    }
    None
}

/// Decode the `data: ` lines of a single frame.
///
/// Lines that are not valid JSON objects are dropped; other SSE fields
/// (`event:`, `id:`, comments) are ignored.
pub fn parse_frame(frame: &str) -> Vec<GatewayConfigEvent> {
    frame
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| line.strip_prefix(DATA_PREFIX))
        .filter_map(|json| match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(obj)) => Some(GatewayConfigEvent::from_object(obj)),
            Ok(other) => {
                tracing::debug!(value = %other, "dropping non-object stream event");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed stream event");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::GatewayEventType;

    #[test]
    fn test_single_frame() {
        let mut dec = FrameDecoder::new();
        let events = dec.push(b"data: {\"type\":\"gateway.switched\",\"x\":1}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, GatewayEventType::GatewaySwitched);
        assert_eq!(events[0].get("x"), Some(&Value::from(1)));
        assert_eq!(dec.pending(), 0);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut dec = FrameDecoder::new();
        assert!(dec.push(b"data: {\"type\":\"hea").is_empty());
        assert!(dec.push(b"rtbeat\"}\n").is_empty());
        let events = dec.push(b"\ndata: {\"type\":\"config.refreshed\"}\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, GatewayEventType::Heartbeat);
        assert_eq!(events[1].kind, GatewayEventType::ConfigRefreshed);
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let frame = "data: {\"type\":\"provider.maintenance\",\"note\":\"Bamakó\"}\n\n".as_bytes();
        let split = frame.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let mut dec = FrameDecoder::new();
        assert!(dec.push(&frame[..split]).is_empty());
        let events = dec.push(&frame[split..]);
        assert_eq!(events[0].get("note"), Some(&Value::from("Bamakó")));
    }

    #[test]
    fn test_invalid_json_is_dropped() {
        let mut dec = FrameDecoder::new();
        assert!(dec.push(b"data: {not json}\n\n").is_empty());
        assert!(dec.push(b"data: [1,2]\n\n").is_empty());
        assert!(dec.push(b": keep-alive comment\n\n").is_empty());
    }

    #[test]
    fn test_crlf_frames() {
        let mut dec = FrameDecoder::new();
        let events = dec.push(b"event: update\r\ndata: {\"type\":\"heartbeat\"}\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, GatewayEventType::Heartbeat);
        assert_eq!(dec.pending(), 0);
    }

    #[test]
    fn test_each_data_line_is_an_event() {
        let events = parse_frame("data: {\"type\":\"heartbeat\"}\ndata: {\"a\":true}");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, GatewayEventType::Unknown);
    }

    #[test]
    fn test_terminator_split_across_chunks() {
        let mut dec = FrameDecoder::new();
        assert!(dec.push(b"data: {\"type\":\"heartbeat\"}\r\n").is_empty());
        assert!(dec.push(b"\r").is_empty());
        let events = dec.push(b"\n");
        assert_eq!(events.len(), 1);
        assert_eq!(dec.pending(), 0);
    }

    #[test]
    fn test_oversized_frame_is_dropped() {
        let mut dec = FrameDecoder::new();
        let junk = vec![b'x'; 64 * 1024];
        for _ in 0..(MAX_FRAME_SIZE / junk.len()) {
            assert!(dec.push(&junk).is_empty());
        }
        assert_eq!(dec.pending(), MAX_FRAME_SIZE);

        assert!(dec.push(b"x").is_empty());
        assert_eq!(dec.pending(), 0);

        // The rest of the oversized frame is skipped, the next one decodes.
        assert!(dec.push(b"data: {\"type\":\"gateway.switched\"}\n\n").is_empty());
        let events = dec.push(b"data: {\"type\":\"heartbeat\"}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, GatewayEventType::Heartbeat);
    }
}
