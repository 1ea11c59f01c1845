//! 导航出口
//!
//! 刷新令牌被拒绝后需要把用户送回登录页。客户端只负责通知，
//! 具体如何跳转（浏览器整页跳转、CLI 提示重新登录）由宿主决定。

use std::sync::Mutex;

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// 只记录日志
#[derive(Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, path: &str) {
        tracing::warn!(target_path = path, "Session expired, sign-in required");
    }
}

/// 记录每一次跳转
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self) -> usize {
        self.visits.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        tracing::info!(target_path = path, "Navigation requested");
        self.visits
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());
    }
}
