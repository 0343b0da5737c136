//! 申请/报价状态

use derive_more::Display;
use handyhub_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 申请状态（Pending 只能流转一次）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, ApplicationStatus::Pending)
    }

    pub fn transition(self, next: ApplicationStatus) -> AppResult<ApplicationStatus> {
        match (self, next) {
            (ApplicationStatus::Pending, ApplicationStatus::Approved)
            | (ApplicationStatus::Pending, ApplicationStatus::Rejected) => Ok(next),
            _ => Err(AppError::failed_precondition(format!(
                "Application is already {}",
                self
            ))),
        }
    }
}
