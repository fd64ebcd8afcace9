pub mod logger;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("网络请求错误: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("后端返回错误 {status}: {body}")]
    StatusError { status: StatusCode, body: String },

    #[error("响应解析错误: {0}")]
    DecodeError(String),

    #[error("上传文件无效: {0}")]
    InvalidUpload(String),

    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML错误: {0}")]
    TomlError(#[from] toml::ser::Error),
}

impl From<config::ConfigError> for DeskError {
    fn from(e: config::ConfigError) -> Self {
        DeskError::ConfigError(e.to_string())
    }
}

pub type DeskResult<T> = Result<T, DeskError>;
