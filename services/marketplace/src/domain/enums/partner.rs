//! 合作伙伴入驻相关枚举

use derive_more::Display;
use handyhub_common::Role;
use handyhub_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 合作伙伴类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum PartnerType {
    Contractor,
    Distributor,
}

impl PartnerType {
    /// 审批通过后账号的角色
    pub fn role(&self) -> Role {
        match self {
            PartnerType::Contractor => Role::Contractor,
            PartnerType::Distributor => Role::Distributor,
        }
    }
}

/// 入驻申请状态
///
/// PendingVerification →(OTP 验证)→ Pending →(管理员)→ Approved | Rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
pub enum PartnerRequestStatus {
    #[default]
    PendingVerification,
    Pending,
    Approved,
    Rejected,
}

impl PartnerRequestStatus {
    /// 尚未结束的申请（同一邮箱只允许一个）
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            PartnerRequestStatus::PendingVerification | PartnerRequestStatus::Pending
        )
    }

    pub fn transition(self, next: PartnerRequestStatus) -> AppResult<PartnerRequestStatus> {
        let allowed = matches!(
            (self, next),
            (PartnerRequestStatus::PendingVerification, PartnerRequestStatus::Pending)
                | (PartnerRequestStatus::Pending, PartnerRequestStatus::Approved)
                | (PartnerRequestStatus::Pending, PartnerRequestStatus::Rejected)
        );
        if allowed {
            Ok(next)
        } else {
            Err(AppError::failed_precondition(format!(
                "Partner request cannot move from {} to {}",
                self, next
            )))
        }
    }
}
