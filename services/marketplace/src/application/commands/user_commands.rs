//! 用户与认证命令

use handyhub_common::Role;
use handyhub_errors::AppResult;
use serde::Deserialize;

use super::{optional_text, require_text, validate_email, validate_password, validate_phone};
use crate::domain::enums::UserStatus;

/// 客户注册
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterCustomerCommand {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl RegisterCustomerCommand {
    pub fn validate(&self) -> AppResult<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        require_text("full_name", &self.full_name, 100)?;
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenCommand {
    pub refresh_token: String,
}

/// 修改个人资料；空字符串的电话表示清除
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileCommand {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl UpdateProfileCommand {
    pub fn validate(&self) -> AppResult<()> {
        optional_text("full_name", self.full_name.as_deref(), 100)?;
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            validate_phone(phone)?;
        }
        Ok(())
    }
}

/// 管理员用户列表查询
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetUserStatusCommand {
    pub status: UserStatus,
}
