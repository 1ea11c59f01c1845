//! 用户角色

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 后端返回的用户角色，序列化名称与后端保持一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Resident,
    Services,
    BrgyOfficials,
    Admin,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Resident,
        UserRole::Services,
        UserRole::BrgyOfficials,
        UserRole::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Resident => "Resident",
            UserRole::Services => "Services",
            UserRole::BrgyOfficials => "BrgyOfficials",
            UserRole::Admin => "Admin",
        }
    }

    /// 登录成功后的落地页
    pub fn landing_path(&self) -> &'static str {
        match self {
            UserRole::Resident => "/dashboards/residents",
            UserRole::Services => "/dashboards/services/map",
            UserRole::BrgyOfficials => "/dashboards/officials",
            UserRole::Admin => "/admin",
        }
    }

    /// 该角色可访问的受保护路径前缀
    pub fn allowed_prefixes(&self) -> &'static [&'static str] {
        match self {
            UserRole::Resident => &["/dashboards/residents"],
            UserRole::Services => &["/dashboards/services"],
            UserRole::BrgyOfficials => &["/dashboards/officials"],
            UserRole::Admin => &["/admin"],
        }
    }

    /// 是否可以自助注册
    pub fn can_self_register(&self) -> bool {
        !matches!(self, UserRole::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("Unknown role: {}", s))
    }
}
