//! 传输层

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::request::{ApiResponse, OutgoingRequest, RequestBody};
use crate::config::ClientConfig;
use crate::error::ClientError;

/// 发送单个 HTTP 请求并读取完整响应
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> Result<ApiResponse, ClientError>;
}

/// 基于 reqwest 的传输层
///
/// 开启 cookie store，跨请求携带后端下发的 cookie。
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .user_agent(concat!("smartbash-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(Duration::from_secs(config.api.timeout_secs))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<ApiResponse, ClientError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(serde_json::to_vec(&value)?),
            RequestBody::Multipart(form) => builder.multipart(form.to_reqwest()?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(ApiResponse::new(status, headers, body))
    }
}
