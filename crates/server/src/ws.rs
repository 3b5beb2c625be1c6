//! Socket endpoints
//!
//! `/ws` speaks the remote socket format (`{type, payload}`), `/rpc` speaks
//! RPC frames (`{event, data}`). Both see every display event; a client that
//! relays an event does not receive it back. Clients whose send fails are
//! dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use contracts::{AnnouncementEvent, ProgramSource, RpcFrame};

use crate::state::AppState;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Wire format of a socket endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Socket,
    Rpc,
}

impl Channel {
    fn label(self) -> &'static str {
        match self {
            Channel::Socket => "ws",
            Channel::Rpc => "rpc",
        }
    }

    fn encode(self, event: &AnnouncementEvent) -> serde_json::Result<String> {
        match self {
            Channel::Socket => serde_json::to_string(event),
            Channel::Rpc => {
                let frame = match event.clone() {
                    AnnouncementEvent::ProgramSelected(p) => RpcFrame::DisplayProgram(p),
                    AnnouncementEvent::ResultSelected(r) => RpcFrame::DisplayResult(r),
                };
                serde_json::to_string(&frame)
            }
        }
    }
}

/// `GET /ws`
pub async fn socket_handler<S>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<S>>,
) -> impl IntoResponse
where
    S: ProgramSource + Send + Sync + 'static,
{
    ws.on_upgrade(move |socket| handle_client(socket, state, Channel::Socket))
}

/// `GET /rpc`
pub async fn rpc_handler<S>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<S>>,
) -> impl IntoResponse
where
    S: ProgramSource + Send + Sync + 'static,
{
    ws.on_upgrade(move |socket| handle_client(socket, state, Channel::Rpc))
}

async fn handle_client<S>(mut socket: WebSocket, state: AppState<S>, channel: Channel)
where
    S: ProgramSource + Send + Sync + 'static,
{
    let client_id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    let mut rx = state.subscribe();
    info!(client = client_id, channel = channel.label(), "Client connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    handle_client_text(&state, channel, client_id, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(client = client_id, error = %e, "Client read failed");
                    break;
                }
            },
            outgoing = rx.recv() => match outgoing {
                Ok(broadcast) if broadcast.origin == Some(client_id) => {}
                Ok(broadcast) => {
                    let text = match channel.encode(&broadcast.event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(component = "server", error = %e, "Display event encode failed");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        debug!(client = client_id, "Send failed, dropping client");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        component = "server",
                        client = client_id,
                        skipped,
                        "Client lagged, events skipped"
                    );
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!(client = client_id, channel = channel.label(), "Client disconnected");
}

/// Messages sent by a client
///
/// Display events are relayed to the other clients; RPC `show_*` requests
/// are resolved against the program source and shown to everyone.
async fn handle_client_text<S>(state: &AppState<S>, channel: Channel, client_id: u64, text: &str)
where
    S: ProgramSource + Send + Sync + 'static,
{
    match channel {
        Channel::Socket => match serde_json::from_str::<AnnouncementEvent>(text) {
            Ok(event) => {
                state.publish(Some(client_id), event);
            }
            Err(e) => {
                debug!(client = client_id, error = %e, "Ignoring non-display socket message");
            }
        },
        Channel::Rpc => match serde_json::from_str::<RpcFrame>(text) {
            Ok(RpcFrame::ShowProgram { program_key }) => {
                if let Some(program) = resolve(state, &program_key).await {
                    state.publish(None, AnnouncementEvent::ProgramSelected(program.display()));
                }
            }
            Ok(RpcFrame::ShowResult {
                program_key,
                result_index,
            }) => {
                let Some(program) = resolve(state, &program_key).await else {
                    return;
                };
                match program.display_result(result_index) {
                    Some(result) => {
                        state.publish(None, AnnouncementEvent::ResultSelected(result));
                    }
                    None => warn!(
                        component = "server",
                        key = %program_key,
                        result_index,
                        "show_result index out of range"
                    ),
                }
            }
            Ok(frame) => {
                let name = frame.name();
                if let Some(event) = frame.into_event() {
                    debug!(client = client_id, event = name, "Relaying display frame");
                    state.publish(Some(client_id), event);
                }
            }
            Err(e) => {
                warn!(
                    component = "server",
                    client = client_id,
                    error = %e,
                    "Unrecognised RPC frame ignored"
                );
            }
        },
    }
}

async fn resolve<S>(state: &AppState<S>, key: &str) -> Option<contracts::Program>
where
    S: ProgramSource + Send + Sync + 'static,
{
    match state.source().fetch_program(key).await {
        Ok(Some(program)) => Some(program),
        Ok(None) => {
            warn!(component = "server", key, "Requested program not found");
            None
        }
        Err(e) => {
            warn!(component = "server", key, error = %e, "Program source failed");
            None
        }
    }
}
