//! Cookie 会话与客户端联动测试

use chrono::Duration;
use smartbash_client::{
    auth::RecordingNavigator,
    client::{ApiClient, ReqwestTransport},
    session::{CookieSessionStore, SessionStore, ACCESS_TOKEN_COOKIE},
};
use std::sync::Arc;

mod common;
use common::{spawn_backend, RefreshMode, DASHBOARD_PATH, FRESH_ACCESS};

fn cookie_client(base: &str, session: Arc<CookieSessionStore>, navigator: Arc<RecordingNavigator>) -> ApiClient {
    let transport = Arc::new(
        ReqwestTransport::new(std::time::Duration::from_secs(5)).expect("Failed to build transport"),
    );
    ApiClient::new(base, transport, session, navigator)
}

#[tokio::test]
async fn test_refresh_rewrites_access_cookie() {
    let (base, _backend) = spawn_backend().await;
    let session = Arc::new(CookieSessionStore::from_cookie_header(
        "access_token=expired-access; refresh_token=refresh-1; user_role=BrgyOfficials",
        Duration::hours(1),
    ));
    let client = cookie_client(&base, session.clone(), Arc::new(RecordingNavigator::new()));

    let response = client.get(DASHBOARD_PATH).await.unwrap();
    assert!(response.is_success());

    assert_eq!(session.get(ACCESS_TOKEN_COOKIE).as_deref(), Some(FRESH_ACCESS));
    let headers = session.set_cookie_headers();
    let access = headers
        .iter()
        .find(|h| h.starts_with("access_token="))
        .unwrap();
    assert!(access.contains("Path=/"));
    assert!(access.contains("SameSite=Lax"));
    // 访问令牌有效期重置为 24 小时
    let max_age: i64 = access
        .split("; ")
        .find_map(|part| part.strip_prefix("Max-Age="))
        .unwrap()
        .parse()
        .unwrap();
    assert!((86390..=86400).contains(&max_age));
}

#[tokio::test]
async fn test_rejected_refresh_empties_jar() {
    let (base, backend) = spawn_backend().await;
    backend.set_refresh_mode(RefreshMode::Reject);
    let session = Arc::new(CookieSessionStore::from_cookie_header(
        "access_token=expired-access; refresh_token=refresh-1; user_role=Resident",
        Duration::hours(1),
    ));
    let navigator = Arc::new(RecordingNavigator::new());
    let client = cookie_client(&base, session.clone(), navigator.clone());

    let response = client.get(DASHBOARD_PATH).await.unwrap();

    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(session.document_cookie(), "");
    assert_eq!(navigator.visits(), vec!["/login".to_string()]);
}
