//! 需求（服务/材料）状态

use derive_more::Display;
use handyhub_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 需求状态
///
/// Open → Assigned → Completed，Open → Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
pub enum RequestStatus {
    /// 开放接受申请
    #[default]
    Open,
    /// 已选定承接方
    Assigned,
    /// 已完成
    Completed,
    /// 已取消
    Cancelled,
}

impl RequestStatus {
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Open, RequestStatus::Assigned)
                | (RequestStatus::Open, RequestStatus::Cancelled)
                | (RequestStatus::Assigned, RequestStatus::Completed)
        )
    }

    pub fn transition(self, next: RequestStatus) -> AppResult<RequestStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::failed_precondition(format!(
                "Request cannot move from {} to {}",
                self, next
            )))
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}
