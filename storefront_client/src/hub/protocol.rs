//! The SignalR JSON hub protocol: record framing, the handshake and the messages the client cares about.
use serde::Deserialize;
use serde_json::Value;
use storefront_engine::traits::{HubMessage, PushError};

/// Every JSON hub message ends with this character.
pub const RECORD_SEPARATOR: char = '\u{1e}';

pub const HANDSHAKE_REQUEST: &str = "{\"protocol\":\"json\",\"version\":1}\u{1e}";
pub const PING_MESSAGE: &str = "{\"type\":6}\u{1e}";

const INVOCATION: u8 = 1;
const PING: u8 = 6;
const CLOSE: u8 = 7;

/// Splits a text stream into complete hub records. Partial records are held back until the rest arrives.
#[derive(Debug, Default)]
pub struct RecordSplitter {
    buffer: String,
}

impl RecordSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);
        let mut records = Vec::new();
        while let Some(end) = self.buffer.find(RECORD_SEPARATOR) {
            let record = self.buffer[..end].trim().to_string();
            self.buffer.drain(..end + RECORD_SEPARATOR.len_utf8());
            if !record.is_empty() {
                records.push(record);
            }
        }
        records
    }
}

#[derive(Deserialize)]
struct HandshakeResponse {
    error: Option<String>,
}

/// Checks the server's reply to the handshake request. An empty object means success.
pub fn parse_handshake(record: &str) -> Result<(), PushError> {
    let response = serde_json::from_str::<HandshakeResponse>(record)
        .map_err(|e| PushError::Handshake(format!("Unexpected handshake response {record}. {e}")))?;
    match response.error {
        Some(e) => Err(PushError::Handshake(e)),
        None => Ok(()),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    #[serde(rename = "type")]
    kind: Option<u8>,
    target: Option<String>,
    #[serde(default)]
    arguments: Vec<Value>,
    error: Option<String>,
    #[serde(default)]
    allow_reconnect: bool,
}

/// Parses one hub record. Message types the client has no use for (completions, stream items, acks) yield `None`.
pub fn parse_message(record: &str) -> Result<Option<HubMessage>, PushError> {
    let raw = serde_json::from_str::<RawMessage>(record)
        .map_err(|e| PushError::Protocol(format!("Invalid hub message. {e}")))?;
    let kind = raw.kind.ok_or_else(|| PushError::Protocol("Hub message has no type".into()))?;
    match kind {
        INVOCATION => {
            let target = raw.target.ok_or_else(|| PushError::Protocol("Invocation has no target".into()))?;
            Ok(Some(HubMessage::Invocation { target, arguments: raw.arguments }))
        },
        PING => Ok(Some(HubMessage::Ping)),
        CLOSE => Ok(Some(HubMessage::Close { error: raw.error, allow_reconnect: raw.allow_reconnect })),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn records_are_split_on_the_separator() {
        let mut splitter = RecordSplitter::new();
        assert_eq!(splitter.feed("{}\u{1e}{\"type\":6}\u{1e}{\"ty"), vec!["{}", "{\"type\":6}"]);
        assert_eq!(splitter.feed("pe\":6}\u{1e}"), vec!["{\"type\":6}"]);
        assert!(splitter.feed("\u{1e}").is_empty());
    }

    #[test]
    fn handshake() {
        assert!(parse_handshake("{}").is_ok());
        assert_eq!(
            parse_handshake("{\"error\":\"Requested protocol 'json' is not available.\"}"),
            Err(PushError::Handshake("Requested protocol 'json' is not available.".into()))
        );
        assert!(matches!(parse_handshake("nonsense"), Err(PushError::Handshake(_))));
    }

    #[test]
    fn invocations() {
        let record = json!({ "type": 1, "target": "OrderUpdated", "arguments": [{ "id": "A1", "status": "ready" }] });
        let message = parse_message(&record.to_string()).unwrap().unwrap();
        assert_eq!(message, HubMessage::Invocation {
            target: "OrderUpdated".into(),
            arguments: vec![json!({ "id": "A1", "status": "ready" })],
        });
        assert!(parse_message("{\"type\":1,\"arguments\":[]}").is_err());
    }

    #[test]
    fn pings_closes_and_the_rest() {
        assert_eq!(parse_message("{\"type\":6}").unwrap(), Some(HubMessage::Ping));
        assert_eq!(
            parse_message("{\"type\":7,\"error\":\"Server shutting down\",\"allowReconnect\":true}").unwrap(),
            Some(HubMessage::Close { error: Some("Server shutting down".into()), allow_reconnect: true })
        );
        assert_eq!(
            parse_message("{\"type\":7}").unwrap(),
            Some(HubMessage::Close { error: None, allow_reconnect: false })
        );
        assert_eq!(parse_message("{\"type\":3,\"invocationId\":\"1\"}").unwrap(), None);
        assert!(parse_message("{}").is_err());
        assert!(parse_message("[1, 2]").is_err());
    }
}
