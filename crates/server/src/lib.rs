//! # Server
//!
//! Reference results backend: serves programs from a `ProgramSource` over
//! REST and rebroadcasts announcements to socket viewers.
//!
//! | route | |
//! |---|---|
//! | `GET /programs` | program summaries |
//! | `GET /programs/{key}` | one program with results, 404 when absent |
//! | `POST /announce` | rebroadcast as a display event |
//! | `GET /ws` | remote socket endpoint |
//! | `GET /rpc` | RPC channel endpoint |
//! | `GET /health` | liveness |

mod error;
mod routes;
mod state;
mod ws;

use std::future::Future;
use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use contracts::ProgramSource;

pub use error::ServerError;
pub use state::{AppState, Broadcast};

/// Build the router over `state`
pub fn router<S>(state: AppState<S>) -> Router
where
    S: ProgramSource + Send + Sync + 'static,
{
    Router::new()
        .route("/programs", get(routes::list_programs::<S>))
        .route("/programs/{key}", get(routes::program_detail::<S>))
        .route("/announce", post(routes::announce::<S>))
        .route("/ws", get(ws::socket_handler::<S>))
        .route("/rpc", get(ws::rpc_handler::<S>))
        .route("/health", get(routes::health))
        .with_state(state)
}

/// Bind `bind` and serve until `shutdown` resolves
pub async fn serve<S, F>(source: S, bind: &str, shutdown: F) -> Result<(), ServerError>
where
    S: ProgramSource + Send + Sync + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = bind.parse().map_err(|e: std::net::AddrParseError| {
        ServerError::InvalidAddr {
            addr: bind.to_string(),
            message: e.to_string(),
        }
    })?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: bind.to_string(),
            source,
        })?;

    serve_listener(listener, AppState::new(source), shutdown).await
}

/// Serve on an already bound listener
pub async fn serve_listener<S, F>(
    listener: TcpListener,
    state: AppState<S>,
    shutdown: F,
) -> Result<(), ServerError>
where
    S: ProgramSource + Send + Sync + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let local = listener.local_addr()?;
    info!(addr = %local, "Results server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Results server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AnnouncementEvent, Program};
    use futures_util::{SinkExt, StreamExt};
    use ingestion::SampleSource;
    use serde_json::{json, Value};
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;
    use tokio::time::{timeout, Duration};
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message;

    struct TestServer {
        addr: SocketAddr,
        state: AppState<SampleSource>,
        stop: Option<oneshot::Sender<()>>,
        task: JoinHandle<Result<(), ServerError>>,
    }

    impl TestServer {
        async fn start() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let state = AppState::new(SampleSource::new());
            let (stop, stopped) = oneshot::channel::<()>();
            let task = tokio::spawn(serve_listener(listener, state.clone(), async move {
                let _ = stopped.await;
            }));
            Self {
                addr,
                state,
                stop: Some(stop),
                task,
            }
        }

        fn url(&self, path: &str) -> String {
            format!("http://{}{}", self.addr, path)
        }

        async fn stop(mut self) {
            if let Some(stop) = self.stop.take() {
                let _ = stop.send(());
            }
            self.task.await.unwrap().unwrap();
        }
    }

    /// Wait until `n` socket clients are subscribed
    async fn wait_for_clients(state: &AppState<SampleSource>, n: usize) {
        for _ in 0..100 {
            if state.client_count() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("clients did not connect");
    }

    async fn next_json<S>(stream: &mut S) -> Value
    where
        S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        loop {
            let message = timeout(Duration::from_secs(2), stream.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            if let Message::Text(text) = message {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_program_routes() {
        let server = TestServer::start().await;

        let programs: Vec<Program> = reqwest::get(server.url("/programs"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(programs.len(), 3);
        assert!(programs.iter().all(|p| p.results.is_empty()));

        let detail: Program = reqwest::get(server.url("/programs/prog-100"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(detail.results.len(), 3);

        let missing = reqwest::get(server.url("/programs/nope")).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

        let health = reqwest::get(server.url("/health")).await.unwrap();
        assert!(health.status().is_success());

        server.stop().await;
    }

    #[tokio::test]
    async fn test_announce_reaches_ws_and_rpc_clients() {
        let server = TestServer::start().await;
        let (mut ws, _) = connect_async(format!("ws://{}/ws", server.addr)).await.unwrap();
        let (mut rpc, _) = connect_async(format!("ws://{}/rpc", server.addr)).await.unwrap();
        wait_for_clients(&server.state, 2).await;

        let response = reqwest::Client::new()
            .post(server.url("/announce"))
            .json(&json!({
                "program_name": "Dance Solo",
                "section": "Senior",
                "result": { "position": "1", "name": "Alex Johnson", "team": "Team Orion" }
            }))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());

        let on_ws = next_json(&mut ws).await;
        assert_eq!(on_ws["type"], "DISPLAY_RESULT");
        assert_eq!(on_ws["payload"]["result"]["name"], "Alex Johnson");

        let on_rpc = next_json(&mut rpc).await;
        assert_eq!(on_rpc["event"], "display_result");
        assert_eq!(on_rpc["data"]["program_name"], "Dance Solo");

        ws.close(None).await.unwrap();
        rpc.close(None).await.unwrap();
        server.stop().await;
    }

    #[tokio::test]
    async fn test_rpc_show_result_resolved_against_source() {
        let server = TestServer::start().await;
        let (mut rpc, _) = connect_async(format!("ws://{}/rpc", server.addr)).await.unwrap();
        wait_for_clients(&server.state, 1).await;

        let request = json!({
            "event": "show_result",
            "data": { "program_key": "prog-200", "result_index": 1 }
        });
        rpc.send(Message::text(request.to_string())).await.unwrap();

        let pushed = next_json(&mut rpc).await;
        assert_eq!(pushed["event"], "display_result");
        assert_eq!(pushed["data"]["program_key"], "prog-200");
        assert_eq!(pushed["data"]["result"]["name"], "Ethan Clark");

        rpc.close(None).await.unwrap();
        server.stop().await;
    }

    #[tokio::test]
    async fn test_socket_relay_skips_sender() {
        let server = TestServer::start().await;
        let (mut sender, _) = connect_async(format!("ws://{}/ws", server.addr)).await.unwrap();
        let (mut viewer, _) = connect_async(format!("ws://{}/ws", server.addr)).await.unwrap();
        wait_for_clients(&server.state, 2).await;

        let event = json!({
            "type": "DISPLAY_PROGRAM",
            "payload": { "program_name": "Quiz", "section": "Open" }
        });
        sender.send(Message::text(event.to_string())).await.unwrap();

        let relayed = next_json(&mut viewer).await;
        assert_eq!(relayed["payload"]["program_name"], "Quiz");
        let parsed: AnnouncementEvent = serde_json::from_value(relayed).unwrap();
        assert_eq!(parsed.program_name(), "Quiz");

        // The sender sees nothing back
        assert!(timeout(Duration::from_millis(150), sender.next()).await.is_err());

        sender.close(None).await.unwrap();
        viewer.close(None).await.unwrap();
        server.stop().await;
    }

    #[tokio::test]
    async fn test_invalid_bind_address() {
        let err = serve(SampleSource::new(), "not-an-addr", async {}).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddr { .. }));
    }
}
