//! 用户实体

use handyhub_common::{AuditInfo, Role, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::enums::UserStatus;

/// 用户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    /// 登录邮箱（小写，唯一）
    email: String,
    full_name: String,
    phone: Option<String>,
    role: Role,
    password_hash: String,
    status: UserStatus,
    audit_info: AuditInfo,
}

impl_document!(User, UserId, "users");

impl User {
    pub fn new(
        email: impl Into<String>,
        full_name: impl Into<String>,
        phone: Option<String>,
        role: Role,
        password_hash: impl Into<String>,
        created_by: Option<UserId>,
    ) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            full_name: full_name.into(),
            phone,
            role,
            password_hash: password_hash.into(),
            status: UserStatus::Active,
            audit_info: AuditInfo::new(created_by),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn update_profile(&mut self, full_name: Option<String>, phone: Option<String>, by: &UserId) {
        if let Some(full_name) = full_name {
            self.full_name = full_name;
        }
        if let Some(phone) = phone {
            self.phone = if phone.trim().is_empty() { None } else { Some(phone) };
        }
        self.audit_info.touch(Some(by.clone()));
    }

    pub fn set_status(&mut self, status: UserStatus, by: &UserId) {
        self.status = status;
        self.audit_info.touch(Some(by.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handyhub_domain_core::AggregateRoot;

    #[test]
    fn test_update_profile_bumps_version() {
        let mut user = User::new("a@example.com", "An", None, Role::Customer, "hash", None);
        let by = UserId::new();
        user.update_profile(Some("An Nguyen".to_string()), Some("0901".to_string()), &by);

        assert_eq!(user.full_name(), "An Nguyen");
        assert_eq!(user.phone(), Some("0901"));
        assert_eq!(user.version(), 2);

        user.update_profile(None, Some("".to_string()), &by);
        assert_eq!(user.phone(), None);
        assert_eq!(user.full_name(), "An Nguyen");
    }

    #[test]
    fn test_lock() {
        let mut user = User::new("a@example.com", "An", None, Role::Contractor, "hash", None);
        assert!(user.is_active());
        user.set_status(UserStatus::Locked, &UserId::new());
        assert!(!user.is_active());
    }
}
