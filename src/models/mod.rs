//! 数据模型模块

pub mod auth;
pub mod role;

pub use auth::{
    LoginRequest, LoginResponse, LoginUser, ProofFile, RefreshRequest, RefreshResponse,
    SignupForm, SignupResponse,
};
pub use role::UserRole;
