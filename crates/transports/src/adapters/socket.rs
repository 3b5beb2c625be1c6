//! Websocket plumbing shared by the remote socket and RPC channel adapters

use std::collections::HashMap;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, instrument, warn};
use url::Url;

use contracts::ContractError;

use crate::error::TransportError;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsWriter = SplitSink<WsStream, Message>;
pub(crate) type WsReader = SplitStream<WsStream>;

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Connection parameters of a socket-based adapter
#[derive(Debug, Clone)]
pub(crate) struct SocketParams {
    pub url: Url,
    pub connect_timeout: Duration,
}

impl SocketParams {
    /// Parse `url` (ws/wss) and optional `connect_timeout_ms`
    pub fn from_params(
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<Self, TransportError> {
        let raw = params
            .get("url")
            .ok_or_else(|| TransportError::invalid_params(name, "missing 'url' parameter"))?;

        let url = Url::parse(raw).map_err(|e| {
            TransportError::invalid_params(name, format!("invalid url '{raw}': {e}"))
        })?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(TransportError::invalid_params(
                name,
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        let connect_timeout_ms = match params.get("connect_timeout_ms") {
            Some(v) => v.parse().map_err(|_| {
                TransportError::invalid_params(name, format!("invalid connect_timeout_ms '{v}'"))
            })?,
            None => DEFAULT_CONNECT_TIMEOUT_MS,
        };

        Ok(Self {
            url,
            connect_timeout: Duration::from_millis(connect_timeout_ms),
        })
    }
}

/// Open the websocket and split it into write/read halves
#[instrument(name = "transport_connect_ws", skip(params), fields(url = %params.url))]
pub(crate) async fn connect_ws(
    name: &str,
    params: &SocketParams,
) -> Result<(WsWriter, WsReader), TransportError> {
    let (stream, _response) =
        tokio::time::timeout(params.connect_timeout, connect_async(params.url.as_str()))
            .await
            .map_err(|_| {
                TransportError::connect(
                    name,
                    format!("timed out after {}ms", params.connect_timeout.as_millis()),
                )
            })?
            .map_err(|e| TransportError::connect(name, e.to_string()))?;

    info!(transport = %name, url = %params.url, "Socket connected");
    Ok(stream.split())
}

/// Send one text frame
pub(crate) async fn send_text(
    writer: &mut Option<WsWriter>,
    name: &str,
    text: String,
) -> Result<(), ContractError> {
    let writer = writer
        .as_mut()
        .ok_or_else(|| ContractError::transport_unavailable(name, "connection closed"))?;
    writer
        .send(Message::text(text))
        .await
        .map_err(|e| ContractError::transport_unavailable(name, e.to_string()))
}

/// Close the write half; a connection that is already gone is not an error
pub(crate) async fn close_writer(writer: &mut Option<WsWriter>, name: &str) {
    if let Some(mut writer) = writer.take() {
        if let Err(e) = writer.close().await {
            debug!(transport = %name, error = %e, "Socket close after peer hangup");
        }
    }
}

/// Drive the read half, handing every text frame to `on_text`
///
/// The task ends when the peer closes or the connection fails; there is no
/// reconnect.
pub(crate) fn spawn_reader<F>(name: String, mut reader: WsReader, mut on_text: F) -> JoinHandle<()>
where
    F: FnMut(&str) + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(message) = reader.next().await {
            match message {
                Ok(Message::Text(text)) => on_text(text.as_str()),
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        component = "transports",
                        transport = %name,
                        error = %e,
                        "Socket read failed, inbound stream stopped"
                    );
                    break;
                }
            }
        }
        info!(transport = %name, "Inbound stream closed");
    })
}

/// Read and discard every frame of a write-only connection
///
/// Keeps the peer from stalling on a full socket buffer. Ends on close or
/// read failure.
pub(crate) fn spawn_drain(name: String, mut reader: WsReader) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut discarded = 0usize;
        while let Some(message) = reader.next().await {
            match message {
                Ok(Message::Close(_)) => break,
                Ok(_) => discarded += 1,
                Err(e) => {
                    debug!(transport = %name, error = %e, "Socket drain read failed");
                    break;
                }
            }
        }
        debug!(transport = %name, discarded, "Socket drain stopped");
    })
}
