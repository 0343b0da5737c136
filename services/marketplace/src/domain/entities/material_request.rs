//! 材料需求实体

use handyhub_common::{AuditInfo, UserId};
use handyhub_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::enums::RequestStatus;
use crate::domain::value_objects::{
    DistributorApplicationId, MaterialItem, MaterialRequestId, validate_items,
};

/// 材料采购需求（客户或承包商发布，供应商报价）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialRequest {
    id: MaterialRequestId,
    requester_id: UserId,
    title: String,
    delivery_address: String,
    items: Vec<MaterialItem>,
    status: RequestStatus,
    selected_application_id: Option<DistributorApplicationId>,
    assigned_distributor_id: Option<UserId>,
    audit_info: AuditInfo,
}

impl_document!(MaterialRequest, MaterialRequestId, "material_requests");

impl MaterialRequest {
    pub fn new(
        requester_id: UserId,
        title: impl Into<String>,
        delivery_address: impl Into<String>,
        items: Vec<MaterialItem>,
    ) -> AppResult<Self> {
        validate_items(&items)?;
        Ok(Self {
            id: MaterialRequestId::new(),
            requester_id: requester_id.clone(),
            title: title.into(),
            delivery_address: delivery_address.into(),
            items,
            status: RequestStatus::Open,
            selected_application_id: None,
            assigned_distributor_id: None,
            audit_info: AuditInfo::new(Some(requester_id)),
        })
    }

    pub fn requester_id(&self) -> &UserId {
        &self.requester_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn delivery_address(&self) -> &str {
        &self.delivery_address
    }

    pub fn items(&self) -> &[MaterialItem] {
        &self.items
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn selected_application_id(&self) -> Option<&DistributorApplicationId> {
        self.selected_application_id.as_ref()
    }

    pub fn assigned_distributor_id(&self) -> Option<&UserId> {
        self.assigned_distributor_id.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.status == RequestStatus::Open
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.requester_id == user_id
    }

    pub fn ensure_owner(&self, user_id: &UserId) -> AppResult<()> {
        if self.is_owned_by(user_id) {
            Ok(())
        } else {
            Err(AppError::forbidden("Only the requester of this material request can do that"))
        }
    }

    pub fn ensure_open(&self) -> AppResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(AppError::failed_precondition(format!(
                "Material request is {}",
                self.status
            )))
        }
    }

    /// 修改需求内容；替换清单会使已有报价失效，因此仅允许在 Open 状态下进行
    pub fn apply_changes(
        &mut self,
        title: Option<String>,
        delivery_address: Option<String>,
        items: Option<Vec<MaterialItem>>,
        by: &UserId,
    ) -> AppResult<()> {
        self.ensure_open()?;
        if let Some(items) = items {
            validate_items(&items)?;
            self.items = items;
        }
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(delivery_address) = delivery_address {
            self.delivery_address = delivery_address;
        }
        self.audit_info.touch(Some(by.clone()));
        Ok(())
    }

    pub fn assign(
        &mut self,
        application_id: DistributorApplicationId,
        distributor_id: UserId,
        by: &UserId,
    ) -> AppResult<()> {
        self.status = self.status.transition(RequestStatus::Assigned)?;
        self.selected_application_id = Some(application_id);
        self.assigned_distributor_id = Some(distributor_id);
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
