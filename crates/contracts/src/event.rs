//! Announcement events and their wire encodings
//!
//! Every event is a full "set current display" command, never a delta, so
//! receiving one twice or out of order is harmless.
//!
//! ## Wire formats
//! - Remote socket: `{"type": "DISPLAY_PROGRAM" | "DISPLAY_RESULT", "payload": {...}}`
//!   (the serde representation of [`AnnouncementEvent`] itself)
//! - RPC channel: `{"event": "show_program" | ..., "data": {...}}` ([`RpcFrame`])
//! - Announce endpoint: `POST /announce` with [`AnnounceRequest`]

use serde::{Deserialize, Serialize};

use crate::{ProgramKey, ResultEntry};

/// Closed set of bus event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ProgramSelected,
    ResultSelected,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::ProgramSelected, EventKind::ResultSelected];

    /// Label used in logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::ProgramSelected => "program_selected",
            EventKind::ResultSelected => "result_selected",
        }
    }
}

/// Payload shown when a program is selected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayProgram {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_key: Option<ProgramKey>,
    pub program_name: String,
    pub section: String,
}

/// Payload shown when a single result is announced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_key: Option<ProgramKey>,
    pub program_name: String,
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_index: Option<usize>,
    pub result: ResultEntry,
}

/// Event carried by the bus and by every transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum AnnouncementEvent {
    #[serde(rename = "DISPLAY_PROGRAM")]
    ProgramSelected(DisplayProgram),
    #[serde(rename = "DISPLAY_RESULT")]
    ResultSelected(DisplayResult),
}

impl AnnouncementEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AnnouncementEvent::ProgramSelected(_) => EventKind::ProgramSelected,
            AnnouncementEvent::ResultSelected(_) => EventKind::ResultSelected,
        }
    }

    pub fn program_name(&self) -> &str {
        match self {
            AnnouncementEvent::ProgramSelected(p) => &p.program_name,
            AnnouncementEvent::ResultSelected(r) => &r.program_name,
        }
    }

    pub fn program_key(&self) -> Option<&ProgramKey> {
        match self {
            AnnouncementEvent::ProgramSelected(p) => p.program_key.as_ref(),
            AnnouncementEvent::ResultSelected(r) => r.program_key.as_ref(),
        }
    }
}

impl From<DisplayProgram> for AnnouncementEvent {
    fn from(value: DisplayProgram) -> Self {
        AnnouncementEvent::ProgramSelected(value)
    }
}

impl From<DisplayResult> for AnnouncementEvent {
    fn from(value: DisplayResult) -> Self {
        AnnouncementEvent::ResultSelected(value)
    }
}

/// RPC channel frame
///
/// `show_*` travel client -> server (display requests), `display_*` travel
/// server -> client (display notifications).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RpcFrame {
    ShowProgram {
        program_key: ProgramKey,
    },
    ShowResult {
        program_key: ProgramKey,
        result_index: usize,
    },
    DisplayProgram(DisplayProgram),
    DisplayResult(DisplayResult),
}

impl RpcFrame {
    /// Outbound request matching an announcement, `None` when the event has no program key
    pub fn request_for(event: &AnnouncementEvent) -> Option<Self> {
        match event {
            AnnouncementEvent::ProgramSelected(p) => Some(RpcFrame::ShowProgram {
                program_key: p.program_key.clone()?,
            }),
            AnnouncementEvent::ResultSelected(r) => Some(RpcFrame::ShowResult {
                program_key: r.program_key.clone()?,
                result_index: r.result_index?,
            }),
        }
    }

    /// Bus event for a server push, `None` for request frames
    pub fn into_event(self) -> Option<AnnouncementEvent> {
        match self {
            RpcFrame::DisplayProgram(p) => Some(AnnouncementEvent::ProgramSelected(p)),
            RpcFrame::DisplayResult(r) => Some(AnnouncementEvent::ResultSelected(r)),
            RpcFrame::ShowProgram { .. } | RpcFrame::ShowResult { .. } => None,
        }
    }

    /// Event name on the wire
    pub fn name(&self) -> &'static str {
        match self {
            RpcFrame::ShowProgram { .. } => "show_program",
            RpcFrame::ShowResult { .. } => "show_result",
            RpcFrame::DisplayProgram(_) => "display_program",
            RpcFrame::DisplayResult(_) => "display_result",
        }
    }
}

/// Body of the REST collaborator's post-announce
///
/// Carries a result when announcing one, only the program otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnounceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_key: Option<ProgramKey>,
    pub program_name: String,
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultEntry>,
}

impl From<&AnnouncementEvent> for AnnounceRequest {
    fn from(event: &AnnouncementEvent) -> Self {
        match event {
            AnnouncementEvent::ProgramSelected(p) => AnnounceRequest {
                program_key: p.program_key.clone(),
                program_name: p.program_name.clone(),
                section: p.section.clone(),
                result_index: None,
                result: None,
            },
            AnnouncementEvent::ResultSelected(r) => AnnounceRequest {
                program_key: r.program_key.clone(),
                program_name: r.program_name.clone(),
                section: r.section.clone(),
                result_index: r.result_index,
                result: Some(r.result.clone()),
            },
        }
    }
}

impl From<AnnounceRequest> for AnnouncementEvent {
    fn from(request: AnnounceRequest) -> Self {
        match request.result {
            Some(result) => AnnouncementEvent::ResultSelected(DisplayResult {
                program_key: request.program_key,
                program_name: request.program_name,
                section: request.section,
                result_index: request.result_index,
                result,
            }),
            None => AnnouncementEvent::ProgramSelected(DisplayProgram {
                program_key: request.program_key,
                program_name: request.program_name,
                section: request.section,
            }),
        }
    }
}
