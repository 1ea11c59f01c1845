//! 路由守卫
//!
//! 按会话中的访问令牌和角色决定页面请求放行还是重定向。

use crate::models::UserRole;
use crate::session::{SessionStore, ACCESS_TOKEN_COOKIE};

/// 需要登录才能访问的路径前缀
pub const PROTECTED_PREFIXES: [&str; 2] = ["/dashboards", "/admin"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    login_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new("/login")
    }
}

impl RouteGuard {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    pub fn is_protected(path: &str) -> bool {
        PROTECTED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
    }

    pub fn evaluate(&self, path: &str, session: &dyn SessionStore) -> GuardDecision {
        let has_token = session
            .get(ACCESS_TOKEN_COOKIE)
            .is_some_and(|token| !token.is_empty());
        let role = session.user_role();

        if Self::is_protected(path) {
            let Some(role) = role.filter(|_| has_token) else {
                return GuardDecision::Redirect(self.login_path.clone());
            };

            if !role.allowed_prefixes().iter().any(|prefix| path.starts_with(prefix)) {
                return GuardDecision::Redirect(self.home_for(role));
            }

            return GuardDecision::Allow;
        }

        // 已登录用户访问登录页时直接进入对应后台
        if path == self.login_path && has_token {
            if let Some(role) = role {
                return GuardDecision::Redirect(self.home_for(role));
            }
        }

        GuardDecision::Allow
    }

    fn home_for(&self, role: UserRole) -> String {
        role.allowed_prefixes()
            .first()
            .map(|prefix| prefix.to_string())
            .unwrap_or_else(|| self.login_path.clone())
    }
}
