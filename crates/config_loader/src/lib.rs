//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `AnnouncerConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("announcer.toml")).unwrap();
//! println!("sources: {}", config.sources.len());
//! ```

mod parser;
mod validator;

pub use contracts::AnnouncerConfig;
pub use parser::ConfigFormat;

use contracts::{ContractError, SourceConfig};
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    ///
    /// Relative sheet paths are resolved against the directory holding the
    /// configuration file.
    pub fn load_from_path(path: &Path) -> Result<AnnouncerConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        let mut config = Self::load_from_str(&content, format)?;
        if let Some(base) = path.parent() {
            Self::resolve_sheet_paths(&mut config, base);
        }
        Ok(config)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<AnnouncerConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already constructed configuration
    pub fn validate(config: &AnnouncerConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize AnnouncerConfig to TOML string
    pub fn to_toml(config: &AnnouncerConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize AnnouncerConfig to JSON string
    pub fn to_json(config: &AnnouncerConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn resolve_sheet_paths(config: &mut AnnouncerConfig, base: &Path) {
        for source in &mut config.sources {
            if let SourceConfig::Sheet(sheet) = source {
                if sheet.path.is_relative() {
                    sheet.path = base.join(&sheet.path);
                }
            }
        }
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<AnnouncerConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::TransportKind;

    const MINIMAL_TOML: &str = r#"
[[sources]]
kind = "sheet"
path = "results.xlsx"

[[sources]]
kind = "rest"
base_url = "http://localhost:8000"

[[sources]]
kind = "sample"

[[transports]]
name = "viewer_ws"
kind = "remote_socket"
[transports.params]
url = "ws://localhost:8000/ws"

[[transports]]
name = "tabs"
kind = "cross_context"

[server]
bind = "127.0.0.1:8000"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.sources.len(), 3);
        assert_eq!(config.transports.len(), 2);
        assert_eq!(config.server.bind, "127.0.0.1:8000");
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.sources.len(), config2.sources.len());
        assert_eq!(config.transports[0].name, config2.transports[0].name);
        assert_eq!(config2.transports[1].kind, TransportKind::CrossContext);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert!(matches!(config2.sources[2], SourceConfig::Sample));
        assert_eq!(config.server.bind, config2.server.bind);
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("announcer.toml");
        std::fs::write(&path, MINIMAL_TOML).unwrap();
        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.transports[0].name, "viewer_ws");

        // Relative sheet paths follow the config file
        match &config.sources[0] {
            SourceConfig::Sheet(sheet) => assert_eq!(sheet.path, dir.path().join("results.xlsx")),
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_absolute_sheet_path_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("announcer.json");
        std::fs::write(
            &path,
            r#"{"sources": [{"kind": "sheet", "path": "/data/results.json"}]}"#,
        )
        .unwrap();
        let config = ConfigLoader::load_from_path(&path).unwrap();
        match &config.sources[0] {
            SourceConfig::Sheet(sheet) => assert_eq!(sheet.path, Path::new("/data/results.json")),
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigLoader::load_from_path(Path::new("announcer.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ConfigLoader::load_from_path(Path::new("/nonexistent/announcer.toml"))
            .unwrap_err();
        assert!(matches!(err, ContractError::Io(_)));
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[[sources]]
kind = "sample"

[[transports]]
name = "log"
kind = "log"

[[transports]]
name = "log"
kind = "log"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }
}
