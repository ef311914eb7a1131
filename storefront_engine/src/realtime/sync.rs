use std::{
    fmt::Display,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::Utc;
use futures_util::StreamExt;
use log::*;
use sf_common::helpers::token_prefix;
use tokio::{sync::watch, task::JoinHandle};

use super::listeners::{ListenerId, ListenerRegistry, OrderListener};
use crate::{
    events::{OrderEvent, OrderEventKind},
    normalize::normalize_order,
    traits::{HubMessage, HubStream, PushError, PushTransport},
};

/// The delays before each reconnection attempt once an established connection drops.
pub const DEFAULT_RECONNECT_DELAYS: [Duration; 4] =
    [Duration::from_secs(0), Duration::from_secs(2), Duration::from_secs(10), Duration::from_secs(30)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// Every reconnection attempt failed. A new call to `connect` is needed.
    Closed,
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

struct Connection {
    token: String,
    task: JoinHandle<()>,
}

/// Keeps the realtime push channel open for one customer and feeds its events to the registered listeners.
pub struct RealtimeSync<T> {
    transport: Arc<T>,
    listeners: Arc<ListenerRegistry>,
    state: Arc<watch::Sender<ConnectionState>>,
    connection: Mutex<Option<Connection>>,
    reconnect_delays: Vec<Duration>,
}

impl<T: PushTransport> RealtimeSync<T> {
    pub fn new(transport: T) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport: Arc::new(transport),
            listeners: Arc::new(ListenerRegistry::new()),
            state: Arc::new(state),
            connection: Mutex::new(None),
            reconnect_delays: DEFAULT_RECONNECT_DELAYS.to_vec(),
        }
    }

    pub fn with_reconnect_delays(mut self, delays: Vec<Duration>) -> Self {
        self.reconnect_delays = delays;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn add_listener(&self, kind: OrderEventKind, listener: OrderListener) -> ListenerId {
        self.listeners.add(kind, listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Opens the push channel using `token`.
    ///
    /// If a connection is already running with the same token it is reused. A connection for a different token is
    /// stopped first. If the channel cannot be opened, the error is returned and the state goes back to
    /// `Disconnected`; callers are expected to carry on without realtime updates.
    pub async fn connect(&self, token: &str) -> Result<(), PushError> {
        {
            let mut connection = self.lock_connection();
            match connection.as_ref() {
                Some(c) if c.token == token && !c.task.is_finished() => {
                    debug!("📡️ Push channel for {} is already running", token_prefix(token));
                    return Ok(());
                },
                Some(_) => {
                    if let Some(old) = connection.take() {
                        debug!("📡️ Stopping the push channel for {}", token_prefix(&old.token));
                        old.task.abort();
                    }
                },
                None => {},
            }
        }
        self.state.send_replace(ConnectionState::Connecting);
        let stream = match self.transport.open(token).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("📡️ Could not open the push channel. Order updates will not arrive until the next refresh. {e}");
                self.state.send_replace(ConnectionState::Disconnected);
                return Err(e);
            },
        };
        info!("📡️ Push channel connected for {}", token_prefix(token));
        self.state.send_replace(ConnectionState::Connected);
        let pump = ConnectionPump {
            transport: Arc::clone(&self.transport),
            listeners: Arc::clone(&self.listeners),
            state: Arc::clone(&self.state),
            token: token.to_string(),
            reconnect_delays: self.reconnect_delays.clone(),
        };
        let task = tokio::spawn(pump.run(stream));
        let previous = self.lock_connection().replace(Connection { token: token.to_string(), task });
        if let Some(previous) = previous {
            previous.task.abort();
        }
        Ok(())
    }

    /// Closes the push channel. Registered listeners are kept for the next connection.
    pub fn disconnect(&self) {
        if let Some(connection) = self.lock_connection().take() {
            connection.task.abort();
            info!("📡️ Push channel for {} closed", token_prefix(&connection.token));
        }
        self.state.send_replace(ConnectionState::Disconnected);
    }

    fn lock_connection(&self) -> std::sync::MutexGuard<'_, Option<Connection>> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Drop for RealtimeSync<T> {
    fn drop(&mut self) {
        let connection = self.connection.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(c) = connection.take() {
            c.task.abort();
        }
    }
}

/// How a connection came to an end.
enum StreamEnd {
    /// The connection dropped, or the server closed it and allowed a reconnect.
    Dropped,
    /// The server closed the connection and asked us not to come back.
    Refused,
}

struct ConnectionPump<T> {
    transport: Arc<T>,
    listeners: Arc<ListenerRegistry>,
    state: Arc<watch::Sender<ConnectionState>>,
    token: String,
    reconnect_delays: Vec<Duration>,
}

impl<T: PushTransport> ConnectionPump<T> {
    async fn run(self, mut stream: HubStream) {
        loop {
            if let StreamEnd::Refused = self.read_until_closed(&mut stream).await {
                self.state.send_replace(ConnectionState::Closed);
                return;
            }
            match self.reconnect().await {
                Some(s) => stream = s,
                None => {
                    error!("📡️ Could not re-establish the push channel. Giving up.");
                    self.state.send_replace(ConnectionState::Closed);
                    return;
                },
            }
        }
    }

    async fn read_until_closed(&self, stream: &mut HubStream) -> StreamEnd {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(HubMessage::Invocation { target, arguments }) => self.on_invocation(&target, &arguments).await,
                Ok(HubMessage::Ping) => trace!("📡️ Ping"),
                Ok(HubMessage::Close { error, allow_reconnect }) => {
                    match &error {
                        Some(e) => warn!("📡️ The server closed the push channel: {e}"),
                        None => info!("📡️ The server closed the push channel"),
                    }
                    return if allow_reconnect { StreamEnd::Dropped } else { StreamEnd::Refused };
                },
                Err(e) => {
                    warn!("📡️ Push channel failed. {e}");
                    return StreamEnd::Dropped;
                },
            }
        }
        info!("📡️ Push channel ended");
        StreamEnd::Dropped
    }

    async fn on_invocation(&self, target: &str, arguments: &[serde_json::Value]) {
        let Some(kind) = OrderEventKind::from_target(target) else {
            debug!("📡️ Ignoring {target} message from the server");
            return;
        };
        let Some(payload) = arguments.first() else {
            warn!("📡️ {kind} event carried no payload. Dropped.");
            return;
        };
        match normalize_order(payload, Utc::now()) {
            Ok(order) => {
                debug!("📡️ {kind} event for order {} ({})", order.id, order.status);
                self.listeners.dispatch(OrderEvent { kind, order }).await;
            },
            Err(e) => warn!("📡️ Dropping malformed {kind} event. {e}"),
        }
    }

    async fn reconnect(&self) -> Option<HubStream> {
        self.state.send_replace(ConnectionState::Reconnecting);
        let attempts = self.reconnect_delays.len();
        for (i, delay) in self.reconnect_delays.iter().enumerate() {
            tokio::time::sleep(*delay).await;
            debug!("📡️ Reconnection attempt {} of {attempts}", i + 1);
            match self.transport.open(&self.token).await {
                Ok(stream) => {
                    info!("📡️ Push channel reconnected");
                    self.state.send_replace(ConnectionState::Connected);
                    return Some(stream);
                },
                Err(e) => warn!("📡️ Reconnection attempt {} failed. {e}", i + 1),
            }
        }
        None
    }
}
