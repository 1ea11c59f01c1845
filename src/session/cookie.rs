//! Cookie 会话存储
//!
//! 按浏览器 `document.cookie` 的语义保存会话：`Path=/`、`SameSite=Lax`、
//! 值做 URL 编码、按 Max-Age 过期，`Max-Age=0` 即删除。
//! 可选持久化到 JSON 文件，供 CLI 在多次调用之间复用会话。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use url::form_urlencoded;

use super::SessionStore;
use crate::config::MAX_COOKIE_AGE_SECS;
use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    /// URL 编码后的值
    pub value: String,
    pub path: String,
    pub expires_at: DateTime<Utc>,
}

impl Cookie {
    /// `max_age` 超过 400 天时按 400 天计
    pub fn new(name: &str, raw_value: &str, max_age: Duration, now: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            value: encode_value(raw_value),
            path: "/".to_string(),
            expires_at: expiry(now, max_age),
        }
    }

    pub fn decoded_value(&self) -> String {
        decode_value(&self.value)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// 剩余有效期（秒），不小于 0
    pub fn max_age_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    /// 渲染为 Set-Cookie 头
    pub fn to_set_cookie(&self, now: DateTime<Utc>) -> String {
        format!(
            "{}={}; Path={}; Max-Age={}; SameSite=Lax",
            self.name,
            self.value,
            self.path,
            self.max_age_secs(now)
        )
    }
}

fn expiry(now: DateTime<Utc>, max_age: Duration) -> DateTime<Utc> {
    let cap = Duration::try_seconds(MAX_COOKIE_AGE_SECS).unwrap_or(Duration::days(400));
    now.checked_add_signed(max_age.min(cap)).unwrap_or(now)
}

/// 近似 encodeURIComponent：字母数字与 `-_.*` 之外均转义，空格编码为 `%20`
pub fn encode_value(raw: &str) -> String {
    // byte_serialize 输出中的 `+` 只可能来自空格
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub fn decode_value(encoded: &str) -> String {
    // 原样出现的 `=`、`&`、`+` 属于值本身
    let escaped = encoded
        .replace('+', "%2B")
        .replace('=', "%3D")
        .replace('&', "%26");
    form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(value, _)| value.into_owned())
        .unwrap_or_default()
}

/// 基于 cookie 罐的会话存储
#[derive(Debug, Default)]
pub struct CookieSessionStore {
    jar: RwLock<BTreeMap<String, Cookie>>,
    file: Option<PathBuf>,
}

impl CookieSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建持久化存储，文件存在时加载已有 cookie
    pub fn persistent(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let mut jar = BTreeMap::new();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<Vec<Cookie>>(&content) {
                Ok(cookies) => {
                    let now = Utc::now();
                    for cookie in cookies.into_iter().filter(|c| !c.is_expired(now)) {
                        jar.insert(cookie.name.clone(), cookie);
                    }
                    tracing::debug!(path = %path.display(), count = jar.len(), "Session loaded");
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Session file is corrupt, starting with an empty session"
                    );
                }
            }
        }

        Ok(Self {
            jar: RwLock::new(jar),
            file: Some(path),
        })
    }

    /// 从请求的 Cookie 头构造，例如 "access_token=abc; user_role=Resident"
    ///
    /// 请求头不携带过期信息，统一使用 `max_age`
    pub fn from_cookie_header(header: &str, max_age: Duration) -> Self {
        let now = Utc::now();
        let mut jar = BTreeMap::new();

        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            jar.insert(
                name.to_string(),
                Cookie {
                    name: name.to_string(),
                    value: value.trim().to_string(),
                    path: "/".to_string(),
                            expires_at: expiry(now, max_age),
                },
            );
        }

        Self {
            jar: RwLock::new(jar),
            file: None,
        }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// 未过期 cookie 的 `document.cookie` 形式
    pub fn document_cookie(&self) -> String {
        let now = Utc::now();
        let jar = self.jar.read().unwrap_or_else(|e| e.into_inner());
        jar.values()
            .filter(|c| !c.is_expired(now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// 未过期 cookie 的 Set-Cookie 头
    pub fn set_cookie_headers(&self) -> Vec<String> {
        let now = Utc::now();
        let jar = self.jar.read().unwrap_or_else(|e| e.into_inner());
        jar.values()
            .filter(|c| !c.is_expired(now))
            .map(|c| c.to_set_cookie(now))
            .collect()
    }

    fn persist(&self, jar: &BTreeMap<String, Cookie>) {
        let Some(path) = &self.file else {
            return;
        };

        let result = (|| -> Result<(), ClientError> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let cookies: Vec<&Cookie> = jar.values().collect();
            write_private(path, &serde_json::to_string_pretty(&cookies)?)?;
            Ok(())
        })();

        // 写盘失败不影响内存中的会话
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "Failed to persist session");
        }
    }
}

/// 会话文件含令牌，unix 下仅属主可读写
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // 已存在的文件不受 mode() 影响
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())
}

impl SessionStore for CookieSessionStore {
    fn get(&self, name: &str) -> Option<String> {
        let now = Utc::now();
        let jar = self.jar.read().unwrap_or_else(|e| e.into_inner());
        jar.get(name)
            .filter(|c| !c.is_expired(now))
            .map(Cookie::decoded_value)
    }

    fn set(&self, name: &str, value: &str, max_age: Duration) {
        let mut jar = self.jar.write().unwrap_or_else(|e| e.into_inner());
        if max_age <= Duration::zero() {
            jar.remove(name);
        } else {
            jar.insert(name.to_string(), Cookie::new(name, value, max_age, Utc::now()));
        }
        self.persist(&jar);
    }

    fn remove(&self, name: &str) {
        let mut jar = self.jar.write().unwrap_or_else(|e| e.into_inner());
        jar.remove(name);
        self.persist(&jar);
    }
}
