//! 配置系统
//! 从环境变量加载客户端配置，并解析后端 API 基础地址

use chrono::Duration;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use url::Url;

/// 未配置任何地址时使用的回环地址
pub const FALLBACK_API_BASE: &str = "http://127.0.0.1:8000/api";

/// cookie 有效期上限（秒），与浏览器的 400 天上限一致
pub const MAX_COOKIE_AGE_SECS: i64 = 400 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// 显式指定的 API 基础地址，例如 "https://api.smartbash.ph/api"
    pub base_url: Option<String>,
    /// 前端页面所在主机名，用于推导 API 地址
    pub page_host: Option<String>,
    /// 推导地址时使用的后端端口
    pub port: u16,
    /// 单次请求超时时间（秒）
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// 访问令牌 cookie 有效期（秒）
    pub access_token_max_age_secs: i64,
    /// 刷新令牌 cookie 有效期（秒）
    pub refresh_token_max_age_secs: i64,
    /// 角色 cookie 有效期（秒）
    pub role_max_age_secs: i64,
    /// 会话持久化文件（可选）
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// 刷新失败时强制跳转的登录页
    pub login_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// 会话 cookie 的有效期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLifetimes {
    pub access_token: Duration,
    pub refresh_token: Duration,
    pub role: Duration,
}

impl Default for SessionLifetimes {
    fn default() -> Self {
        Self {
            access_token: Duration::hours(24),
            refresh_token: Duration::days(7),
            role: Duration::hours(24),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: None,
                page_host: None,
                port: 8000,
                timeout_secs: 30,
            },
            session: SessionConfig {
                access_token_max_age_secs: 86400,
                refresh_token_max_age_secs: 604800,
                role_max_age_secs: 86400,
                file: None,
            },
            auth: AuthConfig {
                login_path: "/login".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

impl ClientConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("api.port", 8000)?
            .set_default("api.timeout_secs", 30)?
            .set_default("session.access_token_max_age_secs", 86400)?
            .set_default("session.refresh_token_max_age_secs", 604800)?
            .set_default("session.role_max_age_secs", 86400)?
            .set_default("auth.login_path", "/login")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?;

        // 从环境变量加载配置（前缀为 SMARTBASH_）
        settings = settings.add_source(
            Environment::with_prefix("SMARTBASH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: ClientConfig = settings.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// 解析 API 基础地址
    ///
    /// 优先级：显式地址 > 页面主机名 + 固定端口 > 回环地址
    pub fn api_base(&self) -> String {
        if let Some(base) = self.api.base_url.as_deref().filter(|s| !s.trim().is_empty()) {
            return base.trim_end_matches('/').to_string();
        }

        if let Some(host) = self.api.page_host.as_deref().filter(|s| !s.trim().is_empty()) {
            return format!("http://{}:{}/api", host.trim(), self.api.port);
        }

        FALLBACK_API_BASE.to_string()
    }

    /// 会话 cookie 有效期
    pub fn lifetimes(&self) -> SessionLifetimes {
        let defaults = SessionLifetimes::default();
        SessionLifetimes {
            access_token: bounded_seconds(self.session.access_token_max_age_secs, defaults.access_token),
            refresh_token: bounded_seconds(self.session.refresh_token_max_age_secs, defaults.refresh_token),
            role: bounded_seconds(self.session.role_max_age_secs, defaults.role),
        }
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base) = self.api.base_url.as_deref().filter(|s| !s.trim().is_empty()) {
            let url = Url::parse(base).map_err(|e| {
                ConfigError::Message(format!("Invalid api.base_url '{}': {}", base, e))
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::Message(format!(
                    "api.base_url must use http or https, got: {}",
                    url.scheme()
                )));
            }
        }

        if self.api.port == 0 {
            return Err(ConfigError::Message("api.port must be non-zero".to_string()));
        }

        if self.api.timeout_secs == 0 || self.api.timeout_secs > 300 {
            return Err(ConfigError::Message(
                "api.timeout_secs must be between 1 and 300".to_string(),
            ));
        }

        let max_ages = [
            self.session.access_token_max_age_secs,
            self.session.refresh_token_max_age_secs,
            self.session.role_max_age_secs,
        ];
        if max_ages.iter().any(|secs| *secs <= 0 || *secs > MAX_COOKIE_AGE_SECS) {
            return Err(ConfigError::Message(format!(
                "session max-age values must be between 1 and {} seconds",
                MAX_COOKIE_AGE_SECS
            )));
        }

        if !self.auth.login_path.starts_with('/') {
            return Err(ConfigError::Message(format!(
                "auth.login_path must be an absolute path, got: {}",
                self.auth.login_path
            )));
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        Ok(())
    }
}

/// 超出范围时回退为默认值
fn bounded_seconds(secs: i64, default: Duration) -> Duration {
    if secs <= 0 || secs > MAX_COOKIE_AGE_SECS {
        return default;
    }
    Duration::try_seconds(secs).unwrap_or(default)
}
