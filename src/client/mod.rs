//! 后端 API 客户端
//!
//! 为每个请求附加 Bearer 访问令牌；令牌失效时刷新一次并重发一次。
//! 一个逻辑请求最多发送两次（首发 + 一次重试），不存在重试循环。

pub mod request;
pub mod transport;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

use crate::auth::navigator::Navigator;
use crate::auth::refresh::{RefreshOutcome, TokenRefresher, REFRESH_PATH};
use crate::config::{ClientConfig, SessionLifetimes};
use crate::error::ClientError;
use crate::session::SessionStore;
use crate::telemetry::{REQUESTS_TOTAL, STALE_RESPONSES_TOTAL};

pub use request::{ApiResponse, MultipartForm, OutgoingRequest, RequestBody, RequestOptions, TOKEN_NOT_VALID};
pub use transport::{ReqwestTransport, Transport};

/// 同一逻辑请求中的发送序号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Initial,
    Retry,
}

impl Attempt {
    pub fn label(&self) -> &'static str {
        match self {
            Attempt::Initial => "initial",
            Attempt::Retry => "retry",
        }
    }
}

pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    refresher: TokenRefresher,
    login_path: String,
    lifetimes: SessionLifetimes,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let lifetimes = SessionLifetimes::default();
        let refresher = TokenRefresher::new(
            transport.clone(),
            session.clone(),
            join_url(&base_url, REFRESH_PATH),
            lifetimes.access_token,
        );

        Self {
            base_url,
            transport,
            session,
            navigator,
            refresher,
            login_path: "/login".to_string(),
            lifetimes,
        }
    }

    /// 按配置创建使用 reqwest 传输层的客户端
    pub fn from_config(
        config: &ClientConfig,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let transport = Arc::new(ReqwestTransport::from_config(config)?);

        Ok(Self::new(config.api_base(), transport, session, navigator)
            .with_login_path(config.auth.login_path.clone())
            .with_lifetimes(config.lifetimes()))
    }

    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn with_lifetimes(mut self, lifetimes: SessionLifetimes) -> Self {
        self.refresher.set_access_max_age(lifetimes.access_token);
        self.lifetimes = lifetimes;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn lifetimes(&self) -> &SessionLifetimes {
        &self.lifetimes
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// 相对路径拼接到 API 基础地址，绝对地址原样返回
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// 发送带认证的请求
    ///
    /// 后端拒绝访问令牌（401/403 或 `token_not_valid`）时刷新一次并重发一次；
    /// 刷新失败则原样返回失效响应。传输层错误直接返回给调用方。
    pub async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, ClientError> {
        let span = tracing::info_span!(
            "api_request",
            request_id = %Uuid::new_v4(),
            method = %options.method,
            path = %path
        );

        self.request_with_refresh(&self.url(path), &options)
            .instrument(span)
            .await
    }

    async fn request_with_refresh(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<ApiResponse, ClientError> {
        let token = match self.session.access_token() {
            Some(token) => Some(token),
            None => {
                debug!("No access token stored, refreshing before request");
                self.refresh().await.into_token()
            }
        };

        let response = self
            .send(Attempt::Initial, url, options, token.as_ref())
            .await?;

        if !response.is_stale() {
            return Ok(response);
        }

        metrics::counter!(STALE_RESPONSES_TOTAL).increment(1);
        warn!(
            status = response.status().as_u16(),
            code = response.error_code().as_deref().unwrap_or(""),
            "Access token rejected"
        );

        match self.refresh().await.into_token() {
            Some(fresh) => self.send(Attempt::Retry, url, options, Some(&fresh)).await,
            None => Ok(response),
        }
    }

    /// 不附加令牌、不刷新、不重试的请求（登录、注册、登出）
    pub async fn request_public(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, ClientError> {
        let span = tracing::info_span!(
            "api_request",
            request_id = %Uuid::new_v4(),
            method = %options.method,
            path = %path
        );

        self.send(Attempt::Initial, &self.url(path), &options, None)
            .instrument(span)
            .await
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.request(path, RequestOptions::get()).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ApiResponse, ClientError> {
        self.request(path, RequestOptions::post().json(body)?).await
    }

    /// 刷新访问令牌
    ///
    /// 刷新令牌被后端拒绝时会话已被清空，这里向导航出口发出一次登录页跳转。
    pub async fn refresh(&self) -> RefreshOutcome {
        let outcome = self.refresher.refresh().await;
        if outcome.is_rejected() {
            self.navigator.navigate(&self.login_path);
        }
        outcome
    }

    async fn send(
        &self,
        attempt: Attempt,
        url: &str,
        options: &RequestOptions,
        token: Option<&SecretString>,
    ) -> Result<ApiResponse, ClientError> {
        let request = build_request(url, options, token)?;

        metrics::counter!(REQUESTS_TOTAL, "attempt" => attempt.label()).increment(1);
        debug!(
            attempt = attempt.label(),
            authorized = token.is_some(),
            "Sending request"
        );

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(attempt = attempt.label(), error = %e, "Request failed");
            e
        })?;

        debug!(
            attempt = attempt.label(),
            status = response.status().as_u16(),
            "Response received"
        );
        Ok(response)
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// 组装请求头：默认 JSON Content-Type（multipart 除外），调用方头覆盖默认值，
/// 有令牌时附加 Authorization
fn build_request(
    url: &str,
    options: &RequestOptions,
    token: Option<&SecretString>,
) -> Result<OutgoingRequest, ClientError> {
    let mut headers = HeaderMap::new();
    let multipart = options.body.is_multipart();

    if !multipart {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    for (name, value) in options.headers.iter() {
        headers.insert(name.clone(), value.clone());
    }

    // multipart 的 boundary 由传输层生成
    if multipart {
        headers.remove(CONTENT_TYPE);
    }

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(OutgoingRequest {
        method: options.method.clone(),
        url: url.to_string(),
        headers,
        body: options.body.clone(),
    })
}
