use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("Could not negotiate a push connection: {0}")]
    Negotiation(String),
    #[error("The server does not offer a supported push transport. Offered: {0}")]
    UnsupportedTransport(String),
    #[error("Push channel handshake failed: {0}")]
    Handshake(String),
    #[error("Push channel transport error: {0}")]
    Transport(String),
    #[error("Push channel protocol error: {0}")]
    Protocol(String),
}

/// A message received over the push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
    /// The server invoked a client method, e.g. `NewOrder`, with the given arguments.
    Invocation { target: String, arguments: Vec<Value> },
    /// Keep-alive
    Ping,
    /// The server is closing the connection.
    Close { error: Option<String>, allow_reconnect: bool },
}

/// The messages of a single open connection. The stream ends (or yields an error) when the connection drops.
pub type HubStream = BoxStream<'static, Result<HubMessage, PushError>>;

/// Opens realtime push connections.
///
/// A transport only knows how to open one connection and hand back its messages. Reconnection, backoff and event
/// dispatch are the responsibility of [`crate::realtime::RealtimeSync`].
#[async_trait]
pub trait PushTransport: Send + Sync + 'static {
    async fn open(&self, token: &str) -> Result<HubStream, PushError>;
}
