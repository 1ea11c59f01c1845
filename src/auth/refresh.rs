//! 令牌刷新
//!
//! 用存储的刷新令牌换取新的访问令牌，结果以 `RefreshOutcome` 返回，
//! 是否跳转登录页由调用方决定。

use chrono::Duration;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::request::{OutgoingRequest, RequestBody};
use crate::client::transport::Transport;
use crate::models::{RefreshRequest, RefreshResponse};
use crate::session::SessionStore;
use crate::telemetry::REFRESH_TOTAL;

/// 刷新接口路径（相对 API 基础地址）
pub const REFRESH_PATH: &str = "/auth/token/refresh/";

/// 刷新结果
#[derive(Debug)]
pub enum RefreshOutcome {
    /// 获得新访问令牌，已写入会话
    Refreshed(SecretString),
    /// 本地没有刷新令牌，未发起网络请求
    NoRefreshToken,
    /// 后端明确拒绝刷新令牌，会话已清空
    Rejected(StatusCode),
    /// 无法完成刷新（网络错误或响应缺少令牌），会话未变
    Unavailable,
}

impl RefreshOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Refreshed(_) => "refreshed",
            RefreshOutcome::NoRefreshToken => "no_refresh_token",
            RefreshOutcome::Rejected(_) => "rejected",
            RefreshOutcome::Unavailable => "unavailable",
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, RefreshOutcome::Rejected(_))
    }

    pub fn token(&self) -> Option<&SecretString> {
        match self {
            RefreshOutcome::Refreshed(token) => Some(token),
            _ => None,
        }
    }

    pub fn into_token(self) -> Option<SecretString> {
        match self {
            RefreshOutcome::Refreshed(token) => Some(token),
            _ => None,
        }
    }
}

pub struct TokenRefresher {
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    endpoint: String,
    access_max_age: Duration,
}

impl TokenRefresher {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
        endpoint: String,
        access_max_age: Duration,
    ) -> Self {
        Self {
            transport,
            session,
            endpoint,
            access_max_age,
        }
    }

    pub fn set_access_max_age(&mut self, max_age: Duration) {
        self.access_max_age = max_age;
    }

    /// 执行一次刷新
    pub async fn refresh(&self) -> RefreshOutcome {
        let outcome = self.exchange().await;
        metrics::counter!(REFRESH_TOTAL, "outcome" => outcome.label()).increment(1);
        outcome
    }

    async fn exchange(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.session.refresh_token() else {
            debug!("No refresh token stored, skipping refresh");
            return RefreshOutcome::NoRefreshToken;
        };

        let body = match RequestBody::json(&RefreshRequest {
            refresh: refresh_token.expose_secret(),
        }) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to encode refresh request");
                return RefreshOutcome::Unavailable;
            }
        };

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let request = OutgoingRequest {
            method: Method::POST,
            url: self.endpoint.clone(),
            headers,
            body,
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                // 无法联系后端不等于令牌失效，不清空会话
                warn!(error = %e, "Token refresh failed: backend unreachable");
                return RefreshOutcome::Unavailable;
            }
        };

        if !response.is_success() {
            warn!(
                status = response.status().as_u16(),
                "Refresh token rejected, clearing session"
            );
            self.session.clear();
            return RefreshOutcome::Rejected(response.status());
        }

        match response.json::<RefreshResponse>() {
            Ok(RefreshResponse {
                access: Some(token),
            }) if !token.expose_secret().is_empty() => {
                self.session.store_access_token(&token, self.access_max_age);
                info!("Access token refreshed");
                RefreshOutcome::Refreshed(token)
            }
            Ok(_) => {
                warn!("Refresh response did not contain an access token");
                RefreshOutcome::Unavailable
            }
            Err(e) => {
                warn!(error = %e, "Invalid refresh response body");
                RefreshOutcome::Unavailable
            }
        }
    }
}
