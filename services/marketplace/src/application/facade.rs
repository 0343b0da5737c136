//! 应用服务装配
//!
//! 事件总线在这里构造，通知处理器是唯一的订阅者。

use std::sync::Arc;

use handyhub_adapter_email::{EmailSender, EmailTemplate};
use handyhub_adapter_llm::LlmClient;
use handyhub_auth_core::TokenService;
use handyhub_config::OtpConfig;
use handyhub_event_core::EventBus;
use handyhub_ports::RealtimePublisher;

use super::chat_service::ChatService;
use super::estimation_service::EstimationService;
use super::material_request_service::MaterialRequestService;
use super::notification_handler::NotificationEventHandler;
use super::notification_service::NotificationService;
use super::partner_service::PartnerService;
use super::service_request_service::ServiceRequestService;
use super::user_service::UserService;
use crate::domain::events::MarketplaceEvent;
use crate::domain::repositories::Repositories;

/// 构造应用层所需的外部依赖
pub struct FacadeDependencies {
    pub repositories: Repositories,
    pub tokens: TokenService,
    pub mailer: Arc<dyn EmailSender>,
    pub templates: Arc<EmailTemplate>,
    pub llm: Option<Arc<dyn LlmClient>>,
    pub realtime: Arc<dyn RealtimePublisher>,
    pub otp: OtpConfig,
}

#[derive(Clone)]
pub struct MarketplaceFacade {
    users: Arc<UserService>,
    service_requests: Arc<ServiceRequestService>,
    material_requests: Arc<MaterialRequestService>,
    partners: Arc<PartnerService>,
    notifications: Arc<NotificationService>,
    chat: Arc<ChatService>,
    estimation: Arc<EstimationService>,
}

impl MarketplaceFacade {
    pub fn new(deps: FacadeDependencies) -> Self {
        let repos = deps.repositories;

        let notifications = Arc::new(NotificationService::new(
            repos.notifications.clone(),
            repos.users.clone(),
            deps.realtime.clone(),
        ));
        let events = Arc::new(
            EventBus::<MarketplaceEvent>::new()
                .with_handler(Arc::new(NotificationEventHandler::new(notifications.clone()))),
        );

        let users = Arc::new(UserService::new(repos.users.clone(), deps.tokens));
        let service_requests = Arc::new(ServiceRequestService::new(
            repos.service_requests.clone(),
            repos.contractor_applications.clone(),
            events.clone(),
        ));
        let material_requests = Arc::new(MaterialRequestService::new(
            repos.material_requests.clone(),
            repos.distributor_applications.clone(),
            events.clone(),
        ));
        let partners = Arc::new(PartnerService::new(
            repos.partner_requests.clone(),
            users.clone(),
            deps.mailer,
            deps.templates,
            deps.otp,
            events,
        ));
        let chat = Arc::new(ChatService::new(
            repos.conversations.clone(),
            repos.messages.clone(),
            repos.users.clone(),
            deps.realtime,
        ));
        let estimation = Arc::new(EstimationService::new(
            deps.llm,
            repos.service_requests.clone(),
            chat.clone(),
        ));

        Self {
            users,
            service_requests,
            material_requests,
            partners,
            notifications,
            chat,
            estimation,
        }
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn service_requests(&self) -> &ServiceRequestService {
        &self.service_requests
    }

    pub fn material_requests(&self) -> &MaterialRequestService {
        &self.material_requests
    }

    pub fn partners(&self) -> &PartnerService {
        &self.partners
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    pub fn estimation(&self) -> &EstimationService {
        &self.estimation
    }
}
