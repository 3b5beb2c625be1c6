//! Ingestion 错误类型

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 表格文件读取失败
    #[error("failed to read sheet {path}: {message}")]
    ReadFailed {
        /// 文件路径
        path: PathBuf,
        /// 错误消息
        message: String,
    },

    /// 表格内容无法解析
    #[error("failed to parse sheet {path}: {message}")]
    ParseFailed {
        /// 文件路径
        path: PathBuf,
        /// 错误消息
        message: String,
    },

    /// 不支持的文件格式
    #[error("unsupported sheet format: {path}")]
    UnsupportedFormat {
        /// 文件路径
        path: PathBuf,
    },

    /// REST 请求失败
    #[error("request to {url} failed: {message}")]
    Http {
        /// 请求地址
        url: String,
        /// 错误消息
        message: String,
    },

    /// 数据源列表为空
    #[error("no program source configured")]
    NoSources,
}

impl IngestionError {
    /// 转换为契约层的 SourceUnavailable
    pub fn into_unavailable(self, source_name: &str) -> ContractError {
        ContractError::source_unavailable(source_name, self.to_string())
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
