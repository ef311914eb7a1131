use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::traits::{HubMessage, HubStream, PushError, PushTransport};

type Frame = Result<HubMessage, PushError>;

#[derive(Default)]
struct FakeState {
    connection: Option<mpsc::UnboundedSender<Frame>>,
    failures_remaining: usize,
    tokens: Vec<String>,
}

/// An in-memory push transport. Tests drive the server side of the current connection.
#[derive(Clone, Default)]
pub struct FakePushTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakePushTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The next `n` attempts to open a connection will fail.
    pub fn fail_next_opens(&self, n: usize) {
        self.state().failures_remaining = n;
    }

    /// The tokens presented by every successful or failed attempt to connect, in order.
    pub fn tokens(&self) -> Vec<String> {
        self.state().tokens.clone()
    }

    pub fn open_count(&self) -> usize {
        self.state().tokens.len()
    }

    pub fn is_open(&self) -> bool {
        self.state().connection.as_ref().map(|c| !c.is_closed()).unwrap_or(false)
    }

    /// Sends a message over the current connection. Returns false if there is no open connection.
    pub fn send(&self, message: HubMessage) -> bool {
        match &self.state().connection {
            Some(tx) => tx.send(Ok(message)).is_ok(),
            None => false,
        }
    }

    pub fn invoke(&self, target: &str, payload: Value) -> bool {
        self.send(HubMessage::Invocation { target: target.to_string(), arguments: vec![payload] })
    }

    /// Fails the current connection with a transport error.
    pub fn break_connection(&self) {
        if let Some(tx) = self.state().connection.take() {
            let _ = tx.send(Err(PushError::Transport("connection reset".into())));
        }
    }

    /// Ends the current connection cleanly, as if the server went away.
    pub fn drop_connection(&self) {
        self.state().connection = None;
    }
}

#[async_trait]
impl PushTransport for FakePushTransport {
    async fn open(&self, token: &str) -> Result<HubStream, PushError> {
        let mut state = self.state();
        state.tokens.push(token.to_string());
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(PushError::Transport("connection refused".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.connection = Some(tx);
        let frames = stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|frame| (frame, rx)) });
        Ok(frames.boxed())
    }
}
