//! REST endpoints of the results backend

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{info, instrument, warn};

use contracts::{AnnounceRequest, AnnouncementEvent, ContractError, ProgramSource};

use crate::state::AppState;

/// `GET /programs`: program summaries, results omitted
#[instrument(name = "server_list_programs", skip(state))]
pub async fn list_programs<S>(State(state): State<AppState<S>>) -> Response
where
    S: ProgramSource + Send + Sync + 'static,
{
    match state.source().list_programs().await {
        Ok(programs) => {
            let summaries: Vec<_> = programs.iter().map(|p| p.summary()).collect();
            Json(summaries).into_response()
        }
        Err(e) => source_failure(e),
    }
}

/// `GET /programs/{key}`: one program with results, 404 when absent
#[instrument(name = "server_program_detail", skip(state))]
pub async fn program_detail<S>(
    State(state): State<AppState<S>>,
    Path(key): Path<String>,
) -> Response
where
    S: ProgramSource + Send + Sync + 'static,
{
    match state.source().fetch_program(&key).await {
        Ok(Some(program)) => Json(program).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Program not found" })),
        )
            .into_response(),
        Err(e) => source_failure(e),
    }
}

/// `POST /announce`: rebroadcast to every socket and RPC client
#[instrument(
    name = "server_announce",
    skip(state, request),
    fields(program = %request.program_name)
)]
pub async fn announce<S>(
    State(state): State<AppState<S>>,
    Json(request): Json<AnnounceRequest>,
) -> Response
where
    S: ProgramSource + Send + Sync + 'static,
{
    let event = AnnouncementEvent::from(request);
    let kind = event.kind().as_str();
    let clients = state.publish(None, event);
    info!(kind, clients, "Announcement received");
    Json(json!({ "status": "ok", "clients": clients })).into_response()
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn source_failure(e: ContractError) -> Response {
    warn!(component = "server", error = %e, "Program source failed");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "detail": e.to_string() })),
    )
        .into_response()
}
