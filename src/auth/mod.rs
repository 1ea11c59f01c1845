//! 认证模块：令牌刷新、登录跳转、路由守卫

pub mod guard;
pub mod navigator;
pub mod refresh;

pub use guard::{GuardDecision, RouteGuard};
pub use navigator::{Navigator, RecordingNavigator, TracingNavigator};
pub use refresh::{RefreshOutcome, TokenRefresher, REFRESH_PATH};
