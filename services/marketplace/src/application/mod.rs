//! 应用层
//!
//! 每个聚合一个服务，由 `MarketplaceFacade` 统一对外暴露

pub mod chat_service;
pub mod commands;
pub mod estimation_service;
pub mod facade;
pub mod material_request_service;
pub mod metrics;
pub mod notification_handler;
pub mod notification_service;
pub mod partner_service;
pub mod service_request_service;
pub mod user_service;

#[cfg(test)]
mod test_support;

pub use chat_service::ChatService;
pub use commands::*;
pub use estimation_service::EstimationService;
pub use facade::{FacadeDependencies, MarketplaceFacade};
pub use material_request_service::MaterialRequestService;
pub use notification_handler::NotificationEventHandler;
pub use notification_service::NotificationService;
pub use partner_service::{PartnerService, PartnerSubmission};
pub use service_request_service::ServiceRequestService;
pub use user_service::{AuthSession, UserService};

use handyhub_common::{Role, UserId};

/// 当前操作者（来自已验证的访问令牌）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
