//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{AnnouncerConfig, ContractError};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<AnnouncerConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<AnnouncerConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<AnnouncerConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SourceConfig, TransportKind};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[[sources]]
kind = "sheet"
path = "results.xlsx"

[[sources]]
kind = "sample"

[[transports]]
name = "viewer_ws"
kind = "remote_socket"
[transports.params]
url = "ws://localhost:8000/ws"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.sources.len(), 2);
        match &config.sources[0] {
            SourceConfig::Sheet(sheet) => {
                assert_eq!(sheet.header_row, 1);
                assert_eq!(sheet.header_scan_limit, 10);
                assert_eq!(sheet.grade_placeholder, "-");
            }
            other => panic!("unexpected source {other:?}"),
        }
        assert_eq!(config.transports[0].kind, TransportKind::RemoteSocket);
        assert_eq!(
            config.transports[0].params.get("url").map(String::as_str),
            Some("ws://localhost:8000/ws")
        );
        assert_eq!(config.server.bind, "0.0.0.0:8000");
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "sources": [{ "kind": "rest", "base_url": "http://localhost:8000" }],
            "transports": [{ "name": "tabs", "kind": "cross_context", "enabled": false }],
            "server": { "bind": "127.0.0.1:9000" }
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert!(!config.transports[0].enabled);
        assert_eq!(config.server.bind, "127.0.0.1:9000");
    }

    #[test]
    fn test_parse_unknown_transport_kind() {
        let content = r#"
[[sources]]
kind = "sample"

[[transports]]
name = "x"
kind = "carrier_pigeon"
"#;
        let err = parse_toml(content).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
