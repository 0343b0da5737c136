//! 服务需求实体

use handyhub_common::{AuditInfo, UserId};
use handyhub_domain_core::Money;
use handyhub_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::enums::RequestStatus;
use crate::domain::value_objects::{ContractorApplicationId, ServiceRequestId};

/// 客户发布的服务需求，承包商通过申请竞标
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    id: ServiceRequestId,
    customer_id: UserId,
    title: String,
    description: String,
    category: String,
    address: String,
    budget: Option<Money>,
    status: RequestStatus,
    selected_application_id: Option<ContractorApplicationId>,
    assigned_contractor_id: Option<UserId>,
    audit_info: AuditInfo,
}

impl_document!(ServiceRequest, ServiceRequestId, "service_requests");

/// 可修改的需求内容
#[derive(Debug, Clone, Default)]
pub struct ServiceRequestChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub budget: Option<Money>,
}

impl ServiceRequest {
    pub fn new(
        customer_id: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        address: impl Into<String>,
        budget: Option<Money>,
    ) -> Self {
        Self {
            id: ServiceRequestId::new(),
            customer_id: customer_id.clone(),
            title: title.into(),
            description: description.into(),
            category: category.into(),
            address: address.into(),
            budget,
            status: RequestStatus::Open,
            selected_application_id: None,
            assigned_contractor_id: None,
            audit_info: AuditInfo::new(Some(customer_id)),
        }
    }

    // ========== Getters ==========

    pub fn customer_id(&self) -> &UserId {
        &self.customer_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn budget(&self) -> Option<&Money> {
        self.budget.as_ref()
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn selected_application_id(&self) -> Option<&ContractorApplicationId> {
        self.selected_application_id.as_ref()
    }

    pub fn assigned_contractor_id(&self) -> Option<&UserId> {
        self.assigned_contractor_id.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.status == RequestStatus::Open
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.customer_id == user_id
    }

    // ========== 状态流转 ==========

    pub fn ensure_owner(&self, user_id: &UserId) -> AppResult<()> {
        if self.is_owned_by(user_id) {
            Ok(())
        } else {
            Err(AppError::forbidden("Only the customer who posted this request can do that"))
        }
    }

    pub fn ensure_open(&self) -> AppResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(AppError::failed_precondition(format!(
                "Service request is {}",
                self.status
            )))
        }
    }

    /// 只有 Open 状态可以修改
    pub fn apply_changes(&mut self, changes: ServiceRequestChanges, by: &UserId) -> AppResult<()> {
        self.ensure_open()?;
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        if let Some(address) = changes.address {
            self.address = address;
        }
        if let Some(budget) = changes.budget {
            self.budget = Some(budget);
        }
        self.audit_info.touch(Some(by.clone()));
        Ok(())
    }

    pub fn assign(
        &mut self,
        application_id: ContractorApplicationId,
        contractor_id: UserId,
        by: &UserId,
    ) -> AppResult<()> {
        self.status = self.status.transition(RequestStatus::Assigned)?;
        self.selected_application_id = Some(application_id);
        self.assigned_contractor_id = Some(contractor_id);
        self.audit_info.touch(Some(by.clone()));
        Ok(())
    }

    pub fn cancel(&mut self, by: &UserId) -> AppResult<()> {
        self.status = self.status.transition(RequestStatus::Cancelled)?;
        self.audit_info.touch(Some(by.clone()));
        Ok(())
    }

    pub fn complete(&mut self, by: &UserId) -> AppResult<()> {
        self.status = self.status.transition(RequestStatus::Completed)?;
        self.audit_info.touch(Some(by.clone()));
        Ok(())
    }
}
