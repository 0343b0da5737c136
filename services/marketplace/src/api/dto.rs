//! 对外的请求/响应结构
//!
//! 含密码哈希或验证码的实体不直接序列化，其余实体原样返回。

use chrono::{DateTime, Utc};
use handyhub_auth_core::TokenPair;
use handyhub_common::{Pagination, Role, UserId};
use handyhub_domain_core::{AggregateRoot, Entity};
use serde::{Deserialize, Serialize};

use crate::application::{AuthSession, PartnerSubmission};
use crate::domain::entities::{PartnerRequest, User};
use crate::domain::enums::{NotificationKind, PartnerRequestStatus, PartnerType, UserStatus};
use crate::domain::value_objects::PartnerRequestId;

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id().clone(),
            email: user.email().to_string(),
            full_name: user.full_name().to_string(),
            phone: user.phone().map(str::to_string),
            role: user.role(),
            status: user.status(),
            created_at: user.audit_info().created_at,
            updated_at: user.audit_info().updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            user: session.user.into(),
            tokens: session.tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PartnerRequestResponse {
    pub id: PartnerRequestId,
    pub email: String,
    pub company_name: String,
    pub contact_name: String,
    pub phone: String,
    pub partner_type: PartnerType,
    pub description: Option<String>,
    pub status: PartnerRequestStatus,
    pub rejection_reason: Option<String>,
    pub user_id: Option<UserId>,
    /// 当前验证码的过期时间
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PartnerRequest> for PartnerRequestResponse {
    fn from(request: PartnerRequest) -> Self {
        Self {
            id: request.id().clone(),
            email: request.email().to_string(),
            company_name: request.company_name().to_string(),
            contact_name: request.contact_name().to_string(),
            phone: request.phone().to_string(),
            partner_type: request.partner_type(),
            description: request.description().map(str::to_string),
            status: request.status(),
            rejection_reason: request.rejection_reason().map(str::to_string),
            user_id: request.user_id().cloned(),
            otp_expires_at: request.otp().map(|otp| otp.expires_at()),
            created_at: request.audit_info().created_at,
            updated_at: request.audit_info().updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PartnerSubmissionResponse {
    pub request: PartnerRequestResponse,
    /// 验证码邮件是否发送成功，失败时可调用重发接口
    pub email_sent: bool,
}

impl From<PartnerSubmission> for PartnerSubmissionResponse {
    fn from(submission: PartnerSubmission) -> Self {
        Self {
            request: submission.request.into(),
            email_sent: submission.email_sent,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextResponse {
    pub text: String,
}

/// 分页查询参数，缺省为第一页
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl PageParams {
    pub fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination::new(
            self.page.unwrap_or(defaults.page),
            self.page_size.unwrap_or(defaults.page_size),
        )
    }
}

/// 按状态过滤
#[derive(Debug, Clone, Deserialize)]
pub struct StatusParams<S> {
    #[serde(default)]
    pub status: Option<S>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationParams {
    #[serde(default)]
    pub unread_only: bool,
}

/// 管理员广播（只推送给在线用户，不落库）
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastRequest {
    #[serde(default)]
    pub role: Option<Role>,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BroadcastResponse {
    pub kind: NotificationKind,
    pub delivered: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use handyhub_common::MAX_PAGE_SIZE;

    #[test]
    fn test_user_response_hides_password_hash() {
        let user = User::new("a@b.vn", "An", None, Role::Customer, "$argon2id$secret", None);
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@b.vn");
        assert_eq!(json["role"], "Customer");
    }

    #[test]
    fn test_page_params_defaults_and_clamping() {
        let p = PageParams::default().pagination();
        assert_eq!((p.page, p.page_size), (1, 20));

        let p = PageParams {
            page: Some(0),
            page_size: Some(1000),
        }
        .pagination();
        assert_eq!((p.page, p.page_size), (1, MAX_PAGE_SIZE));
    }
}
