//! 市场领域事件
//!
//! 命令提交成功后由应用服务发布，通知处理器据此生成站内通知和实时推送。

use handyhub_common::UserId;
use handyhub_domain_core::Money;
use handyhub_event_core::DomainEvent;
use serde::{Deserialize, Serialize};

use super::enums::PartnerType;
use super::value_objects::{
    ContractorApplicationId, DistributorApplicationId, MaterialRequestId, PartnerRequestId,
    ServiceRequestId,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MarketplaceEvent {
    ServiceRequestCreated {
        request_id: ServiceRequestId,
        customer_id: UserId,
        title: String,
        category: String,
    },
    ContractorApplied {
        request_id: ServiceRequestId,
        application_id: ContractorApplicationId,
        customer_id: UserId,
        contractor_id: UserId,
        title: String,
    },
    ContractorApplicationAccepted {
        request_id: ServiceRequestId,
        application_id: ContractorApplicationId,
        contractor_id: UserId,
        title: String,
    },
    ContractorApplicationRejected {
        request_id: ServiceRequestId,
        application_id: ContractorApplicationId,
        contractor_id: UserId,
        title: String,
    },
    ServiceRequestCancelled {
        request_id: ServiceRequestId,
        title: String,
        /// 被自动拒绝的待处理申请人
        notified_contractors: Vec<UserId>,
    },
    ServiceRequestCompleted {
        request_id: ServiceRequestId,
        contractor_id: Option<UserId>,
        title: String,
    },
    MaterialRequestCreated {
        request_id: MaterialRequestId,
        requester_id: UserId,
        title: String,
    },
    DistributorQuoted {
        request_id: MaterialRequestId,
        application_id: DistributorApplicationId,
        requester_id: UserId,
        distributor_id: UserId,
        title: String,
        total: Money,
    },
    DistributorQuoteAccepted {
        request_id: MaterialRequestId,
        application_id: DistributorApplicationId,
        distributor_id: UserId,
        title: String,
    },
    DistributorQuoteRejected {
        request_id: MaterialRequestId,
        application_id: DistributorApplicationId,
        distributor_id: UserId,
        title: String,
    },
    MaterialRequestCancelled {
        request_id: MaterialRequestId,
        title: String,
        notified_distributors: Vec<UserId>,
    },
    MaterialRequestCompleted {
        request_id: MaterialRequestId,
        distributor_id: Option<UserId>,
        title: String,
    },
    PartnerRequestVerified {
        partner_request_id: PartnerRequestId,
        company_name: String,
        partner_type: PartnerType,
    },
}

impl DomainEvent for MarketplaceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceRequestCreated { .. } => "service_request.created",
            Self::ContractorApplied { .. } => "contractor_application.submitted",
            Self::ContractorApplicationAccepted { .. } => "contractor_application.accepted",
            Self::ContractorApplicationRejected { .. } => "contractor_application.rejected",
            Self::ServiceRequestCancelled { .. } => "service_request.cancelled",
            Self::ServiceRequestCompleted { .. } => "service_request.completed",
            Self::MaterialRequestCreated { .. } => "material_request.created",
            Self::DistributorQuoted { .. } => "distributor_application.submitted",
            Self::DistributorQuoteAccepted { .. } => "distributor_application.accepted",
            Self::DistributorQuoteRejected { .. } => "distributor_application.rejected",
            Self::MaterialRequestCancelled { .. } => "material_request.cancelled",
            Self::MaterialRequestCompleted { .. } => "material_request.completed",
            Self::PartnerRequestVerified { .. } => "partner_request.verified",
        }
    }

    fn aggregate_type(&self) -> &'static str {
        match self {
            Self::ServiceRequestCreated { .. }
            | Self::ContractorApplied { .. }
            | Self::ContractorApplicationAccepted { .. }
            | Self::ContractorApplicationRejected { .. }
            | Self::ServiceRequestCancelled { .. }
            | Self::ServiceRequestCompleted { .. } => "service_request",
            Self::MaterialRequestCreated { .. }
            | Self::DistributorQuoted { .. }
            | Self::DistributorQuoteAccepted { .. }
            | Self::DistributorQuoteRejected { .. }
            | Self::MaterialRequestCancelled { .. }
            | Self::MaterialRequestCompleted { .. } => "material_request",
            Self::PartnerRequestVerified { .. } => "partner_request",
        }
    }

    fn aggregate_id(&self) -> String {
        match self {
            Self::ServiceRequestCreated { request_id, .. }
            | Self::ContractorApplied { request_id, .. }
            | Self::ContractorApplicationAccepted { request_id, .. }
            | Self::ContractorApplicationRejected { request_id, .. }
            | Self::ServiceRequestCancelled { request_id, .. }
            | Self::ServiceRequestCompleted { request_id, .. } => request_id.to_string(),
            Self::MaterialRequestCreated { request_id, .. }
            | Self::DistributorQuoted { request_id, .. }
            | Self::DistributorQuoteAccepted { request_id, .. }
            | Self::DistributorQuoteRejected { request_id, .. }
            | Self::MaterialRequestCancelled { request_id, .. }
            | Self::MaterialRequestCompleted { request_id, .. } => request_id.to_string(),
            Self::PartnerRequestVerified {
                partner_request_id, ..
            } => partner_request_id.to_string(),
        }
    }
}
