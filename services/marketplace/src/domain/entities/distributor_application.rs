//! 供应商报价实体

use handyhub_common::{AuditInfo, UserId};
use handyhub_domain_core::{Entity, Money};
use handyhub_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::entities::MaterialRequest;
use crate::domain::enums::ApplicationStatus;
use crate::domain::value_objects::{
    DistributorApplicationId, ItemQuote, MaterialRequestId, quote_total,
};

/// 供应商对材料需求的报价
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributorApplication {
    id: DistributorApplicationId,
    material_request_id: MaterialRequestId,
    distributor_id: UserId,
    message: String,
    quotes: Vec<ItemQuote>,
    /// Σ 单价 × 数量
    total: Money,
    status: ApplicationStatus,
    audit_info: AuditInfo,
}

impl_document!(DistributorApplication, DistributorApplicationId, "distributor_applications");

impl DistributorApplication {
    pub fn new(
        request: &MaterialRequest,
        distributor_id: UserId,
        message: impl Into<String>,
        mut quotes: Vec<ItemQuote>,
    ) -> AppResult<Self> {
        let total = quote_total(request.items(), &quotes)?;
        quotes.sort_by_key(|q| q.item_index);

        Ok(Self {
            id: DistributorApplicationId::new(),
            material_request_id: request.id().clone(),
            distributor_id: distributor_id.clone(),
            message: message.into(),
            quotes,
            total,
            status: ApplicationStatus::Pending,
            audit_info: AuditInfo::new(Some(distributor_id)),
        })
    }

    pub fn material_request_id(&self) -> &MaterialRequestId {
        &self.material_request_id
    }

    pub fn distributor_id(&self) -> &UserId {
        &self.distributor_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn quotes(&self) -> &[ItemQuote] {
        &self.quotes
    }

    pub fn total(&self) -> &Money {
        &self.total
    }

    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    pub fn ensure_applicant(&self, user_id: &UserId) -> AppResult<()> {
        if &self.distributor_id == user_id {
            Ok(())
        } else {
            Err(AppError::forbidden("This quote belongs to another distributor"))
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
