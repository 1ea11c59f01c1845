//! 会话存储
//!
//! 访问令牌、刷新令牌和角色以独立条目保存，写入为后写覆盖，
//! 条目之间不维护任何跨字段约束。

pub mod cookie;
pub mod memory;

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};

use crate::config::SessionLifetimes;
use crate::models::UserRole;

pub use cookie::{Cookie, CookieSessionStore};
pub use memory::MemorySessionStore;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const USER_ROLE_COOKIE: &str = "user_role";

/// 会话存储接口
///
/// 读写均为同步操作。实现需要内部可变性，以便在多个请求之间共享。
pub trait SessionStore: Send + Sync {
    /// 读取条目，已过期或不存在时返回 None
    fn get(&self, name: &str) -> Option<String>;

    /// 写入条目
    fn set(&self, name: &str, value: &str, max_age: Duration);

    /// 删除条目
    fn remove(&self, name: &str);

    fn access_token(&self) -> Option<SecretString> {
        self.get(ACCESS_TOKEN_COOKIE)
            .filter(|v| !v.is_empty())
            .map(SecretString::new)
    }

    fn refresh_token(&self) -> Option<SecretString> {
        self.get(REFRESH_TOKEN_COOKIE)
            .filter(|v| !v.is_empty())
            .map(SecretString::new)
    }

    fn user_role(&self) -> Option<UserRole> {
        self.get(USER_ROLE_COOKIE)?.parse().ok()
    }

    fn store_access_token(&self, token: &SecretString, max_age: Duration) {
        self.set(ACCESS_TOKEN_COOKIE, token.expose_secret(), max_age);
    }

    /// 登录成功后写入完整会话
    fn store_login(
        &self,
        access: &SecretString,
        refresh: &SecretString,
        role: UserRole,
        lifetimes: &SessionLifetimes,
    ) {
        self.set(ACCESS_TOKEN_COOKIE, access.expose_secret(), lifetimes.access_token);
        self.set(REFRESH_TOKEN_COOKIE, refresh.expose_secret(), lifetimes.refresh_token);
        self.set(USER_ROLE_COOKIE, role.as_str(), lifetimes.role);
    }

    /// 清空令牌和角色
    fn clear(&self) {
        self.remove(ACCESS_TOKEN_COOKIE);
        self.remove(REFRESH_TOKEN_COOKIE);
        self.remove(USER_ROLE_COOKIE);
    }
}
