//! 内存会话存储（不处理过期）

use chrono::Duration;
use std::collections::HashMap;
use std::sync::RwLock;

use super::SessionStore;

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置条目
    pub fn with(self, name: &str, value: &str) -> Self {
        self.set(name, value, Duration::zero());
        self
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, name: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(name).cloned()
    }

    fn set(&self, name: &str, value: &str, _max_age: Duration) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(name.to_string(), value.to_string());
    }

    fn remove(&self, name: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(name);
    }
}
