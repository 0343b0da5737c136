//! 领域事件 → 站内通知

use std::sync::Arc;

use async_trait::async_trait;
use handyhub_common::{Role, UserId};
use handyhub_errors::AppResult;
use handyhub_event_core::{EventEnvelope, EventHandler};
use tracing::warn;
use uuid::Uuid;

use super::notification_service::NotificationService;
use crate::domain::enums::NotificationKind;
use crate::domain::events::MarketplaceEvent;

pub struct NotificationEventHandler {
    notifications: Arc<NotificationService>,
}

impl NotificationEventHandler {
    pub fn new(notifications: Arc<NotificationService>) -> Self {
        Self { notifications }
    }

    async fn notify_all(
        &self,
        users: &[UserId],
        kind: NotificationKind,
        title: &str,
        message: &str,
        reference_id: Uuid,
    ) {
        for user_id in users {
            if let Err(e) = self
                .notifications
                .notify(user_id, kind, title, message, Some(reference_id))
                .await
            {
                warn!(user_id = %user_id, kind = %kind, error = %e, "Failed to deliver notification");
            }
        }
    }
}

#[async_trait]
impl EventHandler<MarketplaceEvent> for NotificationEventHandler {
    fn name(&self) -> &'static str {
        "notifications"
    }

    async fn handle(&self, envelope: &EventEnvelope<MarketplaceEvent>) -> AppResult<()> {
        let n = &self.notifications;
        match &envelope.data {
            MarketplaceEvent::ServiceRequestCreated {
                request_id,
                title,
                category,
                ..
            } => {
                n.broadcast(
                    Some(Role::Contractor),
                    NotificationKind::ServiceRequestCreated,
                    "New service request",
                    &format!("{} ({})", title, category),
                    Some(request_id.0),
                );
            }
            MarketplaceEvent::ContractorApplied {
                request_id,
                customer_id,
                title,
                ..
            } => {
                n.notify(
                    customer_id,
                    NotificationKind::ApplicationReceived,
                    "New application",
                    &format!("A contractor applied to \"{}\"", title),
                    Some(request_id.0),
                )
                .await?;
            }
            MarketplaceEvent::ContractorApplicationAccepted {
                request_id,
                contractor_id,
                title,
                ..
            } => {
                n.notify(
                    contractor_id,
                    NotificationKind::ApplicationAccepted,
                    "Application accepted",
                    &format!("Your application for \"{}\" was accepted", title),
                    Some(request_id.0),
                )
                .await?;
            }
            MarketplaceEvent::ContractorApplicationRejected {
                request_id,
                contractor_id,
                title,
                ..
            } => {
                n.notify(
                    contractor_id,
                    NotificationKind::ApplicationRejected,
                    "Application rejected",
                    &format!("Your application for \"{}\" was not selected", title),
                    Some(request_id.0),
                )
                .await?;
            }
            MarketplaceEvent::ServiceRequestCancelled {
                request_id,
                title,
                notified_contractors,
            } => {
                self.notify_all(
                    notified_contractors,
                    NotificationKind::ServiceRequestCancelled,
                    "Service request cancelled",
                    &format!("\"{}\" was cancelled by the customer", title),
                    request_id.0,
                )
                .await;
            }
            MarketplaceEvent::ServiceRequestCompleted {
                request_id,
                contractor_id,
                title,
            } => {
                if let Some(contractor_id) = contractor_id {
                    n.notify(
                        contractor_id,
                        NotificationKind::ServiceRequestCompleted,
                        "Job completed",
                        &format!("\"{}\" was marked as completed", title),
                        Some(request_id.0),
                    )
                    .await?;
                }
            }
            MarketplaceEvent::MaterialRequestCreated {
                request_id, title, ..
            } => {
                n.broadcast(
                    Some(Role::Distributor),
                    NotificationKind::MaterialRequestCreated,
                    "New material request",
                    title,
                    Some(request_id.0),
                );
            }
            MarketplaceEvent::DistributorQuoted {
                request_id,
                requester_id,
                title,
                total,
                ..
            } => {
                n.notify(
                    requester_id,
                    NotificationKind::QuoteReceived,
                    "New quote",
                    &format!(
                        "A distributor quoted {} {} for \"{}\"",
                        total.amount, total.currency.0, title
                    ),
                    Some(request_id.0),
                )
                .await?;
            }
            MarketplaceEvent::DistributorQuoteAccepted {
                request_id,
                distributor_id,
                title,
                ..
            } => {
                n.notify(
                    distributor_id,
                    NotificationKind::QuoteAccepted,
                    "Quote accepted",
                    &format!("Your quote for \"{}\" was accepted", title),
                    Some(request_id.0),
                )
                .await?;
            }
            MarketplaceEvent::DistributorQuoteRejected {
                request_id,
                distributor_id,
                title,
                ..
            } => {
                n.notify(
                    distributor_id,
                    NotificationKind::QuoteRejected,
                    "Quote rejected",
                    &format!("Your quote for \"{}\" was not selected", title),
                    Some(request_id.0),
                )
                .await?;
            }
            MarketplaceEvent::MaterialRequestCancelled {
                request_id,
                title,
                notified_distributors,
            } => {
                self.notify_all(
                    notified_distributors,
                    NotificationKind::MaterialRequestCancelled,
                    "Material request cancelled",
                    &format!("\"{}\" was cancelled by the requester", title),
                    request_id.0,
                )
                .await;
            }
            MarketplaceEvent::MaterialRequestCompleted {
                request_id,
                distributor_id,
                title,
            } => {
                if let Some(distributor_id) = distributor_id {
                    n.notify(
                        distributor_id,
                        NotificationKind::MaterialRequestCompleted,
                        "Delivery completed",
                        &format!("\"{}\" was marked as completed", title),
                        Some(request_id.0),
                    )
                    .await?;
                }
            }
            MarketplaceEvent::PartnerRequestVerified {
                partner_request_id,
                company_name,
                partner_type,
            } => {
                n.notify_role(
                    Role::Admin,
                    NotificationKind::PartnerRequestSubmitted,
                    "New partner request",
                    &format!("{} applied as {}", company_name, partner_type),
                    Some(partner_request_id.0),
                )
                .await?;
            }
        }
        Ok(())
    }
}
