//! SMARTBASH 村务平台客户端库
//! 提供带令牌刷新的 API 客户端、会话存储和认证服务

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod telemetry;
