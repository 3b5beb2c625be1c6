//! AnnouncerConfig - Config Loader output
//!
//! Describes where programs come from (ordered fallback chain), which
//! transports mirror announcements, and where the backend server listens.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use validator::Validate;

/// Channel name shared by cross-context peers unless overridden
pub const DEFAULT_CROSS_CONTEXT_CHANNEL: &str = "result-display";

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete announcer configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnnouncerConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Program sources, tried in declaration order
    #[validate(length(min = 1, message = "at least one program source is required"))]
    pub sources: Vec<SourceConfig>,

    /// Transport adapters; empty means local-bus-only
    #[serde(default)]
    #[validate(nested)]
    pub transports: Vec<TransportConfig>,

    /// Backend server settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl AnnouncerConfig {
    /// Local-only configuration backed by the built-in sample data
    pub fn sample_only() -> Self {
        Self {
            version: ConfigVersion::V1,
            sources: vec![SourceConfig::Sample],
            transports: Vec::new(),
            server: ServerConfig::default(),
        }
    }

    /// Transports with `enabled = true`
    pub fn enabled_transports(&self) -> impl Iterator<Item = &TransportConfig> {
        self.transports.iter().filter(|t| t.enabled)
    }
}

/// One program source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Spreadsheet / JSON grid file
    Sheet(SheetSourceConfig),
    /// REST collaborator
    Rest(RestSourceConfig),
    /// Built-in demo programs
    Sample,
}

impl SourceConfig {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SourceConfig::Sheet(_) => "sheet",
            SourceConfig::Rest(_) => "rest",
            SourceConfig::Sample => "sample",
        }
    }
}

/// Spreadsheet source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSourceConfig {
    /// Workbook (.xlsx/.xls/.ods) or JSON grid path
    pub path: PathBuf,

    /// 0-based row of the first header row
    #[serde(default = "default_header_row")]
    pub header_row: usize,

    /// Rows scanned for a header when `header_row` does not hold one
    #[serde(default = "default_header_scan_limit")]
    pub header_scan_limit: usize,

    /// Grade cell value meaning "no grade"
    #[serde(default = "default_grade_placeholder")]
    pub grade_placeholder: String,
}

fn default_header_row() -> usize {
    1
}

fn default_header_scan_limit() -> usize {
    10
}

fn default_grade_placeholder() -> String {
    "-".to_string()
}

impl SheetSourceConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            header_row: default_header_row(),
            header_scan_limit: default_header_scan_limit(),
            grade_placeholder: default_grade_placeholder(),
        }
    }
}

/// REST collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestSourceConfig {
    /// e.g. "http://localhost:8000"
    pub base_url: String,

    #[serde(default = "default_programs_path")]
    pub programs_path: String,

    /// `:key` is replaced by the percent-encoded program key
    #[serde(default = "default_program_detail_path")]
    pub program_detail_path: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_programs_path() -> String {
    "/programs".to_string()
}

fn default_program_detail_path() -> String {
    "/programs/:key".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl RestSourceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            programs_path: default_programs_path(),
            program_detail_path: default_program_detail_path(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Transport adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransportConfig {
    /// Unique name
    #[validate(length(min = 1, message = "transport name cannot be empty"))]
    pub name: String,

    /// Adapter kind
    pub kind: TransportKind,

    /// Disabled transports are skipped at startup
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Outbound queue capacity
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, message = "queue_capacity must be >= 1"))]
    pub queue_capacity: usize,

    /// Kind-specific parameters (`url`, `base_url`, `channel`, ...)
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_enabled() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    64
}

impl TransportConfig {
    pub fn new(name: impl Into<String>, kind: TransportKind) -> Self {
        Self {
            name: name.into(),
            kind,
            enabled: true,
            queue_capacity: default_queue_capacity(),
            params: HashMap::new(),
        }
    }

    /// Builder-style parameter insertion
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Transport adapter kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Persistent JSON socket to a display endpoint
    RemoteSocket,
    /// Bidirectional request/notification event channel
    RpcChannel,
    /// Sibling contexts of the same process over a named channel
    CrossContext,
    /// HTTP post-announce on the REST collaborator
    AnnounceEndpoint,
    /// Writes notices to the log
    Log,
}

impl TransportKind {
    /// Whether the kind needs a `url` websocket parameter
    pub fn needs_socket_url(self) -> bool {
        matches!(self, TransportKind::RemoteSocket | TransportKind::RpcChannel)
    }
}

/// Backend server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_tag() {
        let json = r#"[{"kind": "sample"}, {"kind": "rest", "base_url": "http://x"}]"#;
        let sources: Vec<SourceConfig> = serde_json::from_str(json).unwrap();
        assert_eq!(sources[0].kind_name(), "sample");
        match &sources[1] {
            SourceConfig::Rest(rest) => {
                assert_eq!(rest.programs_path, "/programs");
                assert_eq!(rest.timeout_ms, 5000);
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_transport_defaults() {
        let json = r#"{"name": "tabs", "kind": "cross_context"}"#;
        let transport: TransportConfig = serde_json::from_str(json).unwrap();
        assert!(transport.enabled);
        assert_eq!(transport.queue_capacity, 64);
        assert!(transport.params.is_empty());
    }

    #[test]
    fn test_field_validation() {
        let mut config = AnnouncerConfig::sample_only();
        config
            .transports
            .push(TransportConfig::new("", TransportKind::Log));
        assert!(config.validate().is_err());

        config.transports[0].name = "log".into();
        assert!(config.validate().is_ok());

        config.transports[0].queue_capacity = 0;
        assert!(config.validate().is_err());
    }
}
