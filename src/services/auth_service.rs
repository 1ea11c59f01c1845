//! 认证服务：登录、登出、注册、会话查询

use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::client::{ApiClient, ApiResponse, RequestOptions};
use crate::error::ClientError;
use crate::models::{LoginRequest, LoginResponse, SignupForm, SignupResponse, UserRole};

pub const LOGIN_PATH: &str = "/auth/login/";
pub const LOGOUT_PATH: &str = "/auth/logout/";
pub const SIGNUP_PATH: &str = "/auth/signup/";

/// 当前登录用户
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub role: UserRole,
}

pub struct AuthService {
    client: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// 用户登录，成功后写入访问令牌、刷新令牌和角色
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ClientError> {
        req.validate()?;

        let response = self
            .client
            .request_public(LOGIN_PATH, RequestOptions::post().json(req)?)
            .await?;

        if !response.is_success() {
            warn!(status = response.status().as_u16(), "Login rejected");
            return Err(rejection(&response, "Login failed"));
        }

        let login: LoginResponse = response.json()?;
        self.client.session().store_login(
            &login.access,
            &login.refresh,
            login.role,
            self.client.lifetimes(),
        );

        info!(user_id = login.user.id, role = %login.role, "Login successful");
        Ok(login)
    }

    /// 用户登出
    ///
    /// 无论后端调用是否成功都会清空本地会话；传输层错误在清空后返回。
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self
            .client
            .request_public(LOGOUT_PATH, RequestOptions::post())
            .await;

        self.client.session().clear();

        match result {
            Ok(response) => {
                if !response.is_success() {
                    warn!(status = response.status().as_u16(), "Logout call returned an error");
                }
                info!("Logged out");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// 用户注册（multipart，包含权限证明文件）
    pub async fn signup(&self, form: &SignupForm) -> Result<SignupResponse, ClientError> {
        form.check()?;

        let response = self
            .client
            .request_public(SIGNUP_PATH, RequestOptions::post().multipart(form.to_multipart()))
            .await?;

        if !response.is_success() {
            warn!(status = response.status().as_u16(), "Registration rejected");
            return Err(rejection(&response, "Registration failed"));
        }

        let signup: SignupResponse = response.json()?;
        info!(
            role = %signup.role.unwrap_or(form.role()),
            created_id = ?signup.created_id,
            "Registration submitted"
        );
        Ok(signup)
    }

    /// 是否持有访问令牌
    pub fn is_authenticated(&self) -> bool {
        self.client.session().access_token().is_some()
    }

    /// 访问令牌与角色都存在时返回当前用户
    pub fn current_user(&self) -> Option<CurrentUser> {
        let session = self.client.session();
        session.access_token()?;
        let role = session.user_role()?;
        Some(CurrentUser { role })
    }
}

/// 用后端的 message 构造错误，缺失时使用默认提示
fn rejection(response: &ApiResponse, fallback: &str) -> ClientError {
    let message = response.message().unwrap_or_else(|| fallback.to_string());

    ClientError::Api {
        status: response.status(),
        message,
    }
}
