//! 测试公共模块
//! 提供本地模拟后端和客户端构造函数

#![allow(dead_code)]

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use smartbash_client::{
    auth::RecordingNavigator,
    client::{ApiClient, ReqwestTransport},
    session::MemorySessionStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// 后端签发的新访问令牌，也是受保护接口唯一接受的令牌
pub const FRESH_ACCESS: &str = "fresh-access";
pub const REFRESH_TOKEN: &str = "refresh-1";
pub const TEST_PASSWORD: &str = "Secret123";

pub const DASHBOARD_PATH: &str = "/auth/officials/dashboard/";

/// 刷新接口的行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// 200 并返回新令牌
    Issue,
    /// 401 拒绝
    Reject,
    /// 200 但缺少 access 字段
    Omit,
}

/// 受保护接口拒绝令牌的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleMode {
    Unauthorized,
    Forbidden,
    /// 200 但 body 中带 `token_not_valid`
    InBand,
    /// 永远拒绝，即使令牌是新的
    Always,
}

/// 模拟后端状态
pub struct Backend {
    pub refresh_mode: Mutex<RefreshMode>,
    pub stale_mode: Mutex<StaleMode>,
    pub refresh_calls: AtomicUsize,
    pub refresh_bodies: Mutex<Vec<Value>>,
    pub refresh_auth: Mutex<Vec<Option<String>>>,
    pub dashboard_calls: AtomicUsize,
    pub dashboard_auth: Mutex<Vec<Option<String>>>,
    pub logout_calls: AtomicUsize,
    pub signup_fields: Mutex<Vec<String>>,
    pub signup_content_type: Mutex<Option<String>>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            refresh_mode: Mutex::new(RefreshMode::Issue),
            stale_mode: Mutex::new(StaleMode::Unauthorized),
            refresh_calls: AtomicUsize::new(0),
            refresh_bodies: Mutex::new(Vec::new()),
            refresh_auth: Mutex::new(Vec::new()),
            dashboard_calls: AtomicUsize::new(0),
            dashboard_auth: Mutex::new(Vec::new()),
            logout_calls: AtomicUsize::new(0),
            signup_fields: Mutex::new(Vec::new()),
            signup_content_type: Mutex::new(None),
        }
    }
}

impl Backend {
    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        *self.refresh_mode.lock().unwrap() = mode;
    }

    pub fn set_stale_mode(&self, mode: StaleMode) {
        *self.stale_mode.lock().unwrap() = mode;
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn dashboard_count(&self) -> usize {
        self.dashboard_calls.load(Ordering::SeqCst)
    }

    pub fn dashboard_auth(&self) -> Vec<Option<String>> {
        self.dashboard_auth.lock().unwrap().clone()
    }
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn refresh_handler(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    backend.refresh_bodies.lock().unwrap().push(body);
    backend.refresh_auth.lock().unwrap().push(authorization(&headers));

    let mode = *backend.refresh_mode.lock().unwrap();
    match mode {
        RefreshMode::Issue => (StatusCode::OK, Json(json!({ "access": FRESH_ACCESS }))).into_response(),
        RefreshMode::Reject => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "detail": "Token is invalid or expired",
                "code": "token_not_valid"
            })),
        )
            .into_response(),
        RefreshMode::Omit => (StatusCode::OK, Json(json!({}))).into_response(),
    }
}

async fn dashboard_handler(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.dashboard_calls.fetch_add(1, Ordering::SeqCst);
    let auth = authorization(&headers);
    backend.dashboard_auth.lock().unwrap().push(auth.clone());

    let mode = *backend.stale_mode.lock().unwrap();
    let expected = format!("Bearer {}", FRESH_ACCESS);
    let accepted = auth.as_deref() == Some(expected.as_str()) && mode != StaleMode::Always;
    if accepted {
        return (StatusCode::OK, Json(json!({ "reports": [], "pending": 3 }))).into_response();
    }

    let stale_body = json!({
        "detail": "Given token not valid for any token type",
        "code": "token_not_valid"
    });
    match mode {
        StaleMode::Unauthorized | StaleMode::Always => {
            (StatusCode::UNAUTHORIZED, Json(stale_body)).into_response()
        }
        StaleMode::Forbidden => (StatusCode::FORBIDDEN, Json(stale_body)).into_response(),
        StaleMode::InBand => (StatusCode::OK, Json(stale_body)).into_response(),
    }
}

async fn login_handler(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if body["password"].as_str() != Some(TEST_PASSWORD) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(json!({
            "message": "Login successful",
            "access": FRESH_ACCESS,
            "refresh": REFRESH_TOKEN,
            "role": "BrgyOfficials",
            "user": { "id": 7, "email": email }
        })),
    )
        .into_response()
}

async fn logout_handler(State(backend): State<Arc<Backend>>) -> Response {
    backend.logout_calls.fetch_add(1, Ordering::SeqCst);
    (StatusCode::OK, Json(json!({ "message": "Logged out" }))).into_response()
}

async fn signup_handler(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    *backend.signup_content_type.lock().unwrap() = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut role = String::new();
    let mut names = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let data = field.bytes().await.unwrap_or_default();
        if name == "role" {
            role = String::from_utf8_lossy(&data).to_string();
        }
        names.push(name);
    }
    *backend.signup_fields.lock().unwrap() = names;

    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful",
            "role": role,
            "created_id": 99
        })),
    )
        .into_response()
}

/// 启动模拟后端，返回 API 基础地址
pub async fn spawn_backend() -> (String, Arc<Backend>) {
    let backend = Arc::new(Backend::default());

    let app = Router::new()
        .route("/api/auth/token/refresh/", post(refresh_handler))
        .route("/api/auth/officials/dashboard/", get(dashboard_handler))
        .route("/api/auth/login/", post(login_handler))
        .route("/api/auth/logout/", post(logout_handler))
        .route("/api/auth/signup/", post(signup_handler))
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{}/api", addr), backend)
}

/// 一个已关闭端口的地址，用于模拟后端不可达
pub async fn unreachable_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    drop(listener);
    format!("http://{}/api", addr)
}

/// 创建使用真实 HTTP 传输层的客户端
pub fn create_test_client(
    base_url: &str,
    session: Arc<MemorySessionStore>,
    navigator: Arc<RecordingNavigator>,
) -> ApiClient {
    let transport = Arc::new(
        ReqwestTransport::new(Duration::from_secs(5)).expect("Failed to build transport"),
    );
    ApiClient::new(base_url, transport, session, navigator)
}
