//! 合作伙伴入驻：邮箱验证码 + 管理员审批

use std::sync::Arc;

use chrono::Utc;
use handyhub_adapter_email::{
    EmailSender, EmailTemplate, PARTNER_APPROVED, PARTNER_OTP, PARTNER_REJECTED,
};
use handyhub_auth_core::{hash_password, require_role};
use handyhub_common::utils::normalize_email;
use handyhub_common::{PagedResult, Pagination, Role};
use handyhub_config::OtpConfig;
use handyhub_domain_core::{AggregateRoot, Entity};
use handyhub_errors::{AppError, AppResult};
use handyhub_event_core::{EventBus, EventMetadata};
use handyhub_ports::{QueryFilter, Repository};
use serde_json::json;
use tracing::{info, warn};

use super::commands::*;
use super::user_service::UserService;
use super::{Actor, metrics};
use crate::domain::entities::{PartnerProfile, PartnerRequest};
use crate::domain::enums::PartnerRequestStatus;
use crate::domain::events::MarketplaceEvent;
use crate::domain::value_objects::PartnerRequestId;

/// 提交结果；验证码邮件发送失败时可调用重发
#[derive(Debug, Clone)]
pub struct PartnerSubmission {
    pub request: PartnerRequest,
    pub email_sent: bool,
}

pub struct PartnerService {
    requests: Arc<dyn Repository<PartnerRequest>>,
    users: Arc<UserService>,
    mailer: Arc<dyn EmailSender>,
    templates: Arc<EmailTemplate>,
    otp: OtpConfig,
    events: Arc<EventBus<MarketplaceEvent>>,
}

impl PartnerService {
    pub fn new(
        requests: Arc<dyn Repository<PartnerRequest>>,
        users: Arc<UserService>,
        mailer: Arc<dyn EmailSender>,
        templates: Arc<EmailTemplate>,
        otp: OtpConfig,
        events: Arc<EventBus<MarketplaceEvent>>,
    ) -> Self {
        Self {
            requests,
            users,
            mailer,
            templates,
            otp,
            events,
        }
    }

    async fn load(&self, id: &PartnerRequestId) -> AppResult<PartnerRequest> {
        self.requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Partner request {} not found", id)))
    }

    /// 等待邮箱验证的申请
    async fn awaiting_verification(&self, email: &str) -> AppResult<PartnerRequest> {
        let filter = QueryFilter::new()
            .eq("email", normalize_email(email))
            .eq("status", PartnerRequestStatus::PendingVerification);
        self.requests
            .find_one(&filter)
            .await?
            .ok_or_else(|| AppError::not_found("No partner request is awaiting verification for this email"))
    }

    async fn send_otp(&self, request: &PartnerRequest, code: &str) -> AppResult<()> {
        let message = self.templates.render_message(
            request.email(),
            "Your HandyHub verification code",
            PARTNER_OTP,
            &json!({
                "contact_name": request.contact_name(),
                "code": code,
                "ttl_minutes": self.otp.ttl_minutes,
            }),
        )?;
        self.mailer.send(message).await
    }

    /// 审批结果邮件失败不影响审批本身
    async fn send_decision(&self, request: &PartnerRequest, template: &str, subject: &str, context: serde_json::Value) {
        let result = match self.templates.render_message(request.email(), subject, template, &context) {
            Ok(message) => self.mailer.send(message).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(request_id = %request.id(), template, error = %e, "Failed to send partner decision email");
        }
    }

    pub async fn submit(&self, cmd: SubmitPartnerRequestCommand) -> AppResult<PartnerSubmission> {
        cmd.validate()?;
        let email = normalize_email(&cmd.email);

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict(format!("Email {} is already registered", email)));
        }
        let open = QueryFilter::new().eq("email", &email).any_of(
            "status",
            [PartnerRequestStatus::PendingVerification, PartnerRequestStatus::Pending],
        );
        if self.requests.count(&open).await? > 0 {
            return Err(AppError::conflict(format!(
                "A partner request for {} is already in progress",
                email
            )));
        }

        let password_hash = hash_password(&cmd.password)?;
        let profile = PartnerProfile {
            email,
            company_name: cmd.company_name.trim().to_string(),
            contact_name: cmd.contact_name.trim().to_string(),
            phone: cmd.phone.trim().to_string(),
            partner_type: cmd.partner_type,
            description: cmd
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        };
        let (request, code) = PartnerRequest::new(profile, password_hash, self.otp.ttl_minutes, Utc::now());
        self.requests.insert(&request).await?;
        metrics::record_partner_request("submitted");
        info!(
            request_id = %request.id(),
            partner_type = %request.partner_type(),
            "Partner request submitted"
        );

        let email_sent = match self.send_otp(&request, &code).await {
            Ok(()) => true,
            Err(e) => {
                warn!(request_id = %request.id(), error = %e, "Failed to send verification code");
                false
            }
        };
        Ok(PartnerSubmission { request, email_sent })
    }

    /// 失败的尝试同样落库，保证尝试次数的上限生效
    pub async fn verify_otp(&self, cmd: VerifyOtpCommand) -> AppResult<PartnerRequest> {
        let mut request = self.awaiting_verification(&cmd.email).await?;
        let expected = request.version();

        let outcome = request.verify_otp(&cmd.code, self.otp.max_attempts, Utc::now());
        if request.version() != expected {
            self.requests.update(&request, expected).await?;
        }
        if let Err(e) = outcome {
            warn!(request_id = %request.id(), reason = %e, "Partner verification failed");
            return Err(e.into());
        }

        metrics::record_partner_request("verified");
        info!(request_id = %request.id(), "Partner email verified");
        self.events
            .publish(
                MarketplaceEvent::PartnerRequestVerified {
                    partner_request_id: request.id().clone(),
                    company_name: request.company_name().to_string(),
                    partner_type: request.partner_type(),
                },
                EventMetadata::new(),
            )
            .await;
        Ok(request)
    }

    pub async fn resend_otp(&self, cmd: ResendOtpCommand) -> AppResult<()> {
        let mut request = self.awaiting_verification(&cmd.email).await?;
        let expected = request.version();

        let code = request.resend_otp(self.otp.ttl_minutes, self.otp.resend_cooldown_secs, Utc::now())?;
        self.requests.update(&request, expected).await?;
        self.send_otp(&request, &code).await?;

        info!(request_id = %request.id(), "Verification code re-sent");
        Ok(())
    }

    pub async fn list(
        &self,
        actor: &Actor,
        query: ListPartnerRequestsQuery,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<PartnerRequest>> {
        require_role!(actor, Role::Admin);
        let filter = QueryFilter::new()
            .eq_opt("status", query.status)
            .search(&["email", "company_name", "contact_name"], query.keyword.as_deref());
        self.requests.find_page(&filter, pagination).await
    }

    pub async fn get(&self, actor: &Actor, id: &PartnerRequestId) -> AppResult<PartnerRequest> {
        require_role!(actor, Role::Admin);
        self.load(id).await
    }

    /// 先创建账号再更新申请；申请更新失败时删除刚创建的账号
    pub async fn approve(&self, actor: &Actor, id: &PartnerRequestId) -> AppResult<PartnerRequest> {
        require_role!(actor, Role::Admin);
        let mut request = self.load(id).await?;
        if request.status() != PartnerRequestStatus::Pending {
            return Err(AppError::failed_precondition(format!(
                "Partner request is {}",
                request.status()
            )));
        }

        let role = request.partner_type().role();
        let user = self
            .users
            .create_account(
                request.email(),
                request.contact_name(),
                Some(request.phone().to_string()),
                role,
                request.password_hash(),
                Some(actor.user_id.clone()),
            )
            .await?;

        let expected = request.version();
        let updated = match request.approve(user.id().clone(), &actor.user_id) {
            Ok(()) => self.requests.update(&request, expected).await,
            Err(e) => Err(e),
        };
        if let Err(e) = updated {
            if let Err(cleanup) = self.users.delete_account(user.id()).await {
                warn!(user_id = %user.id(), error = %cleanup, "Failed to roll back partner account");
            }
            return Err(e);
        }

        metrics::record_partner_request("approved");
        info!(request_id = %id, user_id = %user.id(), role = %role, "Partner request approved");

        self.send_decision(
            &request,
            PARTNER_APPROVED,
            "Your HandyHub partner request was approved",
            json!({
                "contact_name": request.contact_name(),
                "company_name": request.company_name(),
                "partner_type": request.partner_type().to_string(),
                "email": request.email(),
            }),
        )
        .await;
        Ok(request)
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        id: &PartnerRequestId,
        cmd: RejectPartnerRequestCommand,
    ) -> AppResult<PartnerRequest> {
        require_role!(actor, Role::Admin);
        let mut request = self.load(id).await?;

        let expected = request.version();
        request.reject(&cmd.reason, &actor.user_id)?;
        self.requests.update(&request, expected).await?;

        metrics::record_partner_request("rejected");
        info!(request_id = %id, "Partner request rejected");

        self.send_decision(
            &request,
            PARTNER_REJECTED,
            "Your HandyHub partner request",
            json!({
                "contact_name": request.contact_name(),
                "company_name": request.company_name(),
                "reason": request.rejection_reason().unwrap_or_default(),
            }),
        )
        .await;
        Ok(request)
    }
}
