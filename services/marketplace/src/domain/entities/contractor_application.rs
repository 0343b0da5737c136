//! 承包商申请实体

use handyhub_common::{AuditInfo, UserId};
use handyhub_domain_core::Money;
use handyhub_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::enums::ApplicationStatus;
use crate::domain::value_objects::{ContractorApplicationId, ServiceRequestId};

/// 承包商对服务需求的竞标
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractorApplication {
    id: ContractorApplicationId,
    service_request_id: ServiceRequestId,
    contractor_id: UserId,
    message: String,
    estimated_price: Money,
    status: ApplicationStatus,
    audit_info: AuditInfo,
}

impl_document!(ContractorApplication, ContractorApplicationId, "contractor_applications");

impl ContractorApplication {
    pub fn new(
        service_request_id: ServiceRequestId,
        contractor_id: UserId,
        message: impl Into<String>,
        estimated_price: Money,
    ) -> Self {
        Self {
            id: ContractorApplicationId::new(),
            service_request_id,
            contractor_id: contractor_id.clone(),
            message: message.into(),
            estimated_price,
            status: ApplicationStatus::Pending,
            audit_info: AuditInfo::new(Some(contractor_id)),
        }
    }

    pub fn service_request_id(&self) -> &ServiceRequestId {
        &self.service_request_id
    }

    pub fn contractor_id(&self) -> &UserId {
        &self.contractor_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn estimated_price(&self) -> &Money {
        &self.estimated_price
    }

    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    pub fn ensure_applicant(&self, user_id: &UserId) -> AppResult<()> {
        if &self.contractor_id == user_id {
            Ok(())
        } else {
            Err(AppError::forbidden("This application belongs to another contractor"))
        }
    }

    pub fn approve(&mut self, by: &UserId) -> AppResult<()> {
        self.status = self.status.transition(ApplicationStatus::Approved)?;
        self.audit_info.touch(Some(by.clone()));
        Ok(())
    }

    pub fn reject(&mut self, by: &UserId) -> AppResult<()> {
        self.status = self.status.transition(ApplicationStatus::Rejected)?;
        self.audit_info.touch(Some(by.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approve_once() {
        let contractor = UserId::new();
        let mut app = ContractorApplication::new(
            ServiceRequestId::new(),
            contractor.clone(),
            "Can come tomorrow",
            Money::vnd(450_000),
        );
        assert!(app.is_pending());
        assert!(app.ensure_applicant(&contractor).is_ok());
        assert!(app.ensure_applicant(&UserId::new()).is_err());

        let customer = UserId::new();
        app.approve(&customer).unwrap();
        assert_eq!(app.status(), ApplicationStatus::Approved);
        assert!(app.reject(&customer).is_err());
    }
}
