//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则 (`validator` derive): 至少一个 source、transport 名称非空、queue_capacity >= 1
//! - transport 名称唯一
//! - socket 类 transport 必须提供 ws:// / wss:// url
//! - announce_endpoint 必须提供 http(s) base_url
//! - sheet 路径非空、rest base_url 合法
//! - server.bind 为合法 socket 地址

use std::collections::HashSet;
use std::net::SocketAddr;

use contracts::{AnnouncerConfig, ContractError, SourceConfig, TransportConfig, TransportKind};
use url::Url;
use validator::Validate;

/// 校验 AnnouncerConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &AnnouncerConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_sources(config)?;
    validate_transport_names(config)?;
    validate_transport_params(config)?;
    validate_server(config)?;
    Ok(())
}

/// 字段级规则
fn validate_fields(config: &AnnouncerConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|e| ContractError::config_validation("config", e.to_string()))
}

/// 校验 source 配置
fn validate_sources(config: &AnnouncerConfig) -> Result<(), ContractError> {
    for (idx, source) in config.sources.iter().enumerate() {
        match source {
            SourceConfig::Sheet(sheet) => {
                if sheet.path.as_os_str().is_empty() {
                    return Err(ContractError::config_validation(
                        format!("sources[{idx}].path"),
                        "sheet path cannot be empty",
                    ));
                }
            }
            SourceConfig::Rest(rest) => {
                check_url(
                    &format!("sources[{idx}].base_url"),
                    &rest.base_url,
                    &["http", "https"],
                )?;
                if !rest.program_detail_path.contains(":key") {
                    return Err(ContractError::config_validation(
                        format!("sources[{idx}].program_detail_path"),
                        "program_detail_path must contain ':key'",
                    ));
                }
            }
            SourceConfig::Sample => {}
        }
    }
    Ok(())
}

/// 校验 transport 名称唯一性
fn validate_transport_names(config: &AnnouncerConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for transport in &config.transports {
        if !seen.insert(transport.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("transports[name={}]", transport.name),
                "duplicate transport name",
            ));
        }
    }
    Ok(())
}

/// 校验 transport 参数 (禁用的 transport 同样校验)
fn validate_transport_params(config: &AnnouncerConfig) -> Result<(), ContractError> {
    for transport in &config.transports {
        match transport.kind {
            kind if kind.needs_socket_url() => {
                let url = required_param(transport, "url")?;
                check_url(&param_field(transport, "url"), url, &["ws", "wss"])?;
            }
            TransportKind::AnnounceEndpoint => {
                let base_url = required_param(transport, "base_url")?;
                check_url(
                    &param_field(transport, "base_url"),
                    base_url,
                    &["http", "https"],
                )?;
            }
            TransportKind::CrossContext => {
                if let Some(channel) = transport.params.get("channel") {
                    if channel.trim().is_empty() {
                        return Err(ContractError::config_validation(
                            param_field(transport, "channel"),
                            "channel name cannot be blank",
                        ));
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// 校验 server 配置
fn validate_server(config: &AnnouncerConfig) -> Result<(), ContractError> {
    config
        .server
        .bind
        .parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|e| {
            ContractError::config_validation(
                "server.bind",
                format!("invalid listen address '{}': {e}", config.server.bind),
            )
        })
}

fn required_param<'a>(transport: &'a TransportConfig, key: &str) -> Result<&'a str, ContractError> {
    transport
        .params
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| {
            ContractError::config_validation(
                param_field(transport, key),
                format!("missing '{key}' parameter"),
            )
        })
}

fn param_field(transport: &TransportConfig, key: &str) -> String {
    format!("transports[{}].params.{}", transport.name, key)
}

fn check_url(field: &str, raw: &str, schemes: &[&str]) -> Result<(), ContractError> {
    let url = Url::parse(raw)
        .map_err(|e| ContractError::config_validation(field, format!("invalid url '{raw}': {e}")))?;
    if !schemes.contains(&url.scheme()) {
        return Err(ContractError::config_validation(
            field,
            format!(
                "unsupported scheme '{}', expected one of {:?}",
                url.scheme(),
                schemes
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{RestSourceConfig, SheetSourceConfig};

    fn minimal_config() -> AnnouncerConfig {
        let mut config = AnnouncerConfig::sample_only();
        config.sources.insert(
            0,
            SourceConfig::Sheet(SheetSourceConfig::new("results.xlsx")),
        );
        config.transports.push(
            TransportConfig::new("viewer_ws", TransportKind::RemoteSocket)
                .with_param("url", "ws://localhost:8000/ws"),
        );
        config.transports.push(
            TransportConfig::new("backend", TransportKind::AnnounceEndpoint)
                .with_param("base_url", "http://localhost:8000"),
        );
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn test_no_sources() {
        let mut config = minimal_config();
        config.sources.clear();
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_duplicate_transport_name() {
        let mut config = minimal_config();
        config.transports.push(config.transports[0].clone());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("duplicate transport name"), "got: {err}");
    }

    #[test]
    fn test_socket_url_required() {
        let mut config = minimal_config();
        config.transports[0].params.clear();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("missing 'url'"), "got: {err}");
    }

    #[test]
    fn test_socket_url_scheme() {
        let mut config = minimal_config();
        config.transports[0]
            .params
            .insert("url".into(), "http://localhost:8000/ws".into());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("unsupported scheme"), "got: {err}");
    }

    #[test]
    fn test_rest_detail_path_needs_key() {
        let mut config = minimal_config();
        let mut rest = RestSourceConfig::new("http://localhost:8000");
        rest.program_detail_path = "/programs/detail".into();
        config.sources.push(SourceConfig::Rest(rest));
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains(":key"), "got: {err}");
    }

    #[test]
    fn test_blank_cross_context_channel() {
        let mut config = minimal_config();
        config.transports.push(
            TransportConfig::new("tabs", TransportKind::CrossContext).with_param("channel", "  "),
        );
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("channel"), "got: {err}");
    }

    #[test]
    fn test_invalid_bind() {
        let mut config = minimal_config();
        config.server.bind = "not-an-address".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("server.bind"), "got: {err}");
    }
}
