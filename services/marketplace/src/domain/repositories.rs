//! 仓储集合

use std::sync::Arc;

use handyhub_ports::Repository;

use super::entities::{
    ChatMessage, ContractorApplication, Conversation, DistributorApplication, MaterialRequest,
    Notification, PartnerRequest, ServiceRequest, User,
};

/// 应用层使用的全部仓储，由存储适配器统一构造
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn Repository<User>>,
    pub service_requests: Arc<dyn Repository<ServiceRequest>>,
    pub contractor_applications: Arc<dyn Repository<ContractorApplication>>,
    pub material_requests: Arc<dyn Repository<MaterialRequest>>,
    pub distributor_applications: Arc<dyn Repository<DistributorApplication>>,
    pub partner_requests: Arc<dyn Repository<PartnerRequest>>,
    pub notifications: Arc<dyn Repository<Notification>>,
    pub conversations: Arc<dyn Repository<Conversation>>,
    pub messages: Arc<dyn Repository<ChatMessage>>,
}
