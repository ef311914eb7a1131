//! A [`PushTransport`] for ASP.NET SignalR hubs, using the server-sent events transport.
//!
//! Opening a connection takes four steps:
//! 1. `POST {hub}/negotiate?negotiateVersion=1` to get a connection token and the list of transports the server offers.
//! 2. `GET {hub}?id={token}` with `Accept: text/event-stream`. The hub's messages arrive over this response.
//! 3. `POST {hub}?id={token}` with the JSON protocol handshake. Everything the client sends goes over POSTs like this.
//! 4. Wait for the handshake response on the event stream.
//!
//! While the connection is open, a ping is sent every [`PING_INTERVAL`] so the server does not time us out.
mod protocol;
mod sse;

use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures_util::{stream::BoxStream, StreamExt};
use log::*;
use reqwest::{header, Client, Url};
use serde::Deserialize;
use storefront_engine::traits::{HubMessage, HubStream, PushError, PushTransport};
use tokio::task::JoinHandle;

pub use self::{
    protocol::{parse_handshake, parse_message, RecordSplitter, HANDSHAKE_REQUEST, PING_MESSAGE, RECORD_SEPARATOR},
    sse::SseDecoder,
};
use crate::{config::StorefrontConfig, error::push_transport_error};

pub const PING_INTERVAL: Duration = Duration::from_secs(15);
const SSE_TRANSPORT: &str = "ServerSentEvents";
const MAX_NEGOTIATE_REDIRECTS: usize = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NegotiateResponse {
    connection_id: Option<String>,
    connection_token: Option<String>,
    #[serde(default)]
    available_transports: Vec<AvailableTransport>,
    /// Set when the negotiation is redirected, e.g. to a hosted SignalR service.
    url: Option<String>,
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailableTransport {
    transport: String,
    #[serde(default)]
    transfer_formats: Vec<String>,
}

/// Where, and with which token, to open the event stream once negotiation is done.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Negotiated {
    hub_url: Url,
    connection_id: String,
    access_token: String,
}

#[derive(Clone)]
pub struct SignalRTransport {
    hub_url: String,
    client: Arc<Client>,
}

impl SignalRTransport {
    pub fn new(config: &StorefrontConfig) -> Result<Self, PushError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PushError::Negotiation(e.to_string()))?;
        Ok(Self { hub_url: config.hub_url.clone(), client: Arc::new(client) })
    }

    async fn negotiate(&self, token: &str) -> Result<Negotiated, PushError> {
        let mut hub_url = parse_url(&self.hub_url)?;
        let mut access_token = token.to_string();
        for _ in 0..MAX_NEGOTIATE_REDIRECTS {
            let mut url = hub_url.clone();
            url.path_segments_mut()
                .map_err(|_| PushError::Negotiation(format!("{hub_url} cannot be a hub url")))?
                .pop_if_empty()
                .push("negotiate");
            url.query_pairs_mut().append_pair("negotiateVersion", "1");
            trace!("📡️ Negotiating with {url}");
            let response = self
                .client
                .post(url)
                .bearer_auth(&access_token)
                .header(header::CONTENT_LENGTH, 0)
                .send()
                .await
                .map_err(|e| PushError::Negotiation(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(PushError::Negotiation(format!("Error {}. {body}", status.as_u16())));
            }
            let negotiation =
                response.json::<NegotiateResponse>().await.map_err(|e| PushError::Negotiation(e.to_string()))?;
            match evaluate_negotiation(negotiation, &hub_url, &access_token)? {
                NegotiationStep::Redirect { url, token } => {
                    debug!("📡️ Negotiation redirected to {url}");
                    hub_url = url;
                    access_token = token;
                },
                NegotiationStep::Done(negotiated) => return Ok(negotiated),
            }
        }
        Err(PushError::Negotiation("Too many negotiation redirects".into()))
    }

    async fn send_text(client: &Client, target: &Url, token: &str, text: &'static str) -> Result<(), PushError> {
        let response = client
            .post(target.clone())
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(text)
            .send()
            .await
            .map_err(push_transport_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(PushError::Transport(format!("The hub rejected a message with error {}", response.status().as_u16())))
        }
    }
}

#[async_trait]
impl PushTransport for SignalRTransport {
    async fn open(&self, token: &str) -> Result<HubStream, PushError> {
        let negotiated = self.negotiate(token).await?;
        let mut target = negotiated.hub_url.clone();
        target.query_pairs_mut().append_pair("id", &negotiated.connection_id);
        debug!("📡️ Opening the event stream for connection {}", negotiated.connection_id);

        let response = self
            .client
            .get(target.clone())
            .bearer_auth(&negotiated.access_token)
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(push_transport_error)?;
        if !response.status().is_success() {
            return Err(PushError::Transport(format!(
                "The hub refused the event stream with error {}",
                response.status().as_u16()
            )));
        }
        let body = response.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec())).boxed();
        let mut reader = HubReader::new(body);

        Self::send_text(&self.client, &target, &negotiated.access_token, HANDSHAKE_REQUEST)
            .await
            .map_err(|e| PushError::Handshake(e.to_string()))?;
        match reader.next_record().await {
            Some(Ok(record)) => parse_handshake(&record)?,
            Some(Err(e)) => return Err(PushError::Handshake(e.to_string())),
            None => return Err(PushError::Handshake("The hub closed the stream during the handshake".into())),
        }
        info!("📡️ Hub handshake complete");

        let pinger = {
            let client = Arc::clone(&self.client);
            let token = negotiated.access_token.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(PING_INTERVAL);
                interval.tick().await;
                loop {
                    interval.tick().await;
                    if let Err(e) = Self::send_text(&client, &target, &token, PING_MESSAGE).await {
                        warn!("📡️ Could not ping the hub. {e}");
                    }
                }
            })
        };
        let state = (reader, AbortOnDrop(pinger));
        let messages = futures_util::stream::unfold(state, |(mut reader, guard)| async move {
            let message = reader.next_message().await?;
            Some((message, (reader, guard)))
        });
        Ok(messages.boxed())
    }
}

/// Aborts the wrapped task when dropped, so the pinger stops when the message stream goes away.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

type BodyStream = BoxStream<'static, Result<Vec<u8>, reqwest::Error>>;

/// Turns the raw event stream body into hub records and messages.
struct HubReader {
    body: BodyStream,
    sse: SseDecoder,
    records: RecordSplitter,
    pending: VecDeque<String>,
}

impl HubReader {
    fn new(body: BodyStream) -> Self {
        Self { body, sse: SseDecoder::new(), records: RecordSplitter::new(), pending: VecDeque::new() }
    }

    async fn next_record(&mut self) -> Option<Result<String, PushError>> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            match self.body.next().await? {
                Ok(chunk) => {
                    for event in self.sse.feed(&chunk) {
                        self.pending.extend(self.records.feed(&event));
                    }
                },
                Err(e) => return Some(Err(push_transport_error(e))),
            }
        }
    }

    /// The next message the engine needs to see. Records that cannot be parsed are logged and skipped.
    async fn next_message(&mut self) -> Option<Result<HubMessage, PushError>> {
        loop {
            let record = match self.next_record().await? {
                Ok(record) => record,
                Err(e) => return Some(Err(e)),
            };
            match parse_message(&record) {
                Ok(Some(message)) => return Some(Ok(message)),
                Ok(None) => trace!("📡️ Ignoring hub record {record}"),
                Err(e) => warn!("📡️ Skipping an unreadable hub record. {e}"),
            }
        }
    }
}

enum NegotiationStep {
    Redirect { url: Url, token: String },
    Done(Negotiated),
}

fn evaluate_negotiation(
    response: NegotiateResponse,
    hub_url: &Url,
    access_token: &str,
) -> Result<NegotiationStep, PushError> {
    if let Some(e) = response.error {
        return Err(PushError::Negotiation(e));
    }
    if let Some(url) = response.url {
        let token = response.access_token.unwrap_or_else(|| access_token.to_string());
        return Ok(NegotiationStep::Redirect { url: parse_url(&url)?, token });
    }
    let supports_sse = response
        .available_transports
        .iter()
        .any(|t| t.transport == SSE_TRANSPORT && t.transfer_formats.iter().any(|f| f == "Text"));
    if !supports_sse {
        let offered = response.available_transports.iter().map(|t| t.transport.as_str()).collect::<Vec<_>>();
        return Err(PushError::UnsupportedTransport(offered.join(", ")));
    }
    let connection_id = response
        .connection_token
        .or(response.connection_id)
        .ok_or_else(|| PushError::Negotiation("The negotiation response has no connection id".into()))?;
    Ok(NegotiationStep::Done(Negotiated {
        hub_url: hub_url.clone(),
        connection_id,
        access_token: access_token.to_string(),
    }))
}

fn parse_url(url: &str) -> Result<Url, PushError> {
    Url::parse(url).map_err(|e| PushError::Negotiation(format!("Invalid hub url {url}. {e}")))
}
