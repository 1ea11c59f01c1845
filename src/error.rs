//! 统一错误模型
//! 定义客户端所有错误类型

use reqwest::StatusCode;
use thiserror::Error;

/// 客户端错误类型
#[derive(Debug, Error)]
pub enum ClientError {
    /// 传输层失败（连接、DNS、超时）
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// 后端明确拒绝（非 2xx）
    #[error("Request rejected ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("Session storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    /// 构造传输层错误
    pub fn network(message: impl Into<String>) -> Self {
        ClientError::Network(message.into().into())
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => "Unable to reach the server".to_string(),
            ClientError::Config(_) => "Configuration error".to_string(),
            ClientError::InvalidHeader(_) => "Invalid request".to_string(),
            ClientError::Decode(_) => "Unexpected response from the server".to_string(),
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Storage(_) => "Unable to store session".to_string(),
        }
    }

    /// 是否为传输层失败
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// 后端返回的状态码（如有）
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network(Box::new(e))
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for ClientError {
    fn from(e: config::ConfigError) -> Self {
        ClientError::Config(e.to_string())
    }
}

/// 只取第一条字段错误作为提示
impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field))
                })
            })
            .next()
            .unwrap_or_else(|| "Invalid input".to_string());
        ClientError::Validation(message)
    }
}
