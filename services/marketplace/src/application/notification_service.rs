//! 通知服务：持久化站内通知并通过实时通道推送

use std::sync::Arc;

use handyhub_common::{PagedResult, Pagination, Role, UserId};
use handyhub_domain_core::{AggregateRoot, Entity};
use handyhub_errors::{AppError, AppResult};
use handyhub_ports::{QueryFilter, RealtimeMessage, RealtimePublisher, Recipient, Repository};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::metrics;
use crate::domain::entities::{Notification, User};
use crate::domain::enums::{NotificationKind, UserStatus};
use crate::domain::value_objects::NotificationId;

/// 推送事件名
pub const NOTIFICATION_CREATED: &str = "notification.created";
pub const NOTIFICATION_BROADCAST: &str = "notification.broadcast";

pub struct NotificationService {
    notifications: Arc<dyn Repository<Notification>>,
    users: Arc<dyn Repository<User>>,
    realtime: Arc<dyn RealtimePublisher>,
}

impl NotificationService {
    pub fn new(
        notifications: Arc<dyn Repository<Notification>>,
        users: Arc<dyn Repository<User>>,
        realtime: Arc<dyn RealtimePublisher>,
    ) -> Self {
        Self {
            notifications,
            users,
            realtime,
        }
    }

    fn push(&self, recipient: &Recipient, event: &str, payload: serde_json::Value) -> usize {
        let delivered = self.realtime.publish(recipient, RealtimeMessage::new(event, payload));
        metrics::record_notifications_pushed(delivered);
        delivered
    }

    /// 持久化并推送给单个用户
    pub async fn notify(
        &self,
        user_id: &UserId,
        kind: NotificationKind,
        title: &str,
        message: &str,
        reference_id: Option<Uuid>,
    ) -> AppResult<Notification> {
        let notification = Notification::new(user_id.clone(), kind, title, message, reference_id);
        self.notifications.insert(&notification).await?;

        let payload = serde_json::to_value(&notification)
            .map_err(|e| AppError::internal(format!("Failed to serialize notification: {}", e)))?;
        let delivered = self.push(&Recipient::User(user_id.clone()), NOTIFICATION_CREATED, payload);

        debug!(
            notification_id = %notification.id(),
            user_id = %user_id,
            kind = %kind,
            delivered,
            "Notification stored"
        );
        Ok(notification)
    }

    /// 为某角色的每个活跃用户持久化一条通知
    pub async fn notify_role(
        &self,
        role: Role,
        kind: NotificationKind,
        title: &str,
        message: &str,
        reference_id: Option<Uuid>,
    ) -> AppResult<usize> {
        let filter = QueryFilter::new()
            .eq("role", role)
            .eq("status", UserStatus::Active);
        let users = self.users.find_all(&filter).await?;

        let mut sent = 0;
        for user in &users {
            match self.notify(user.id(), kind, title, message, reference_id).await {
                Ok(_) => sent += 1,
                Err(e) => warn!(user_id = %user.id(), error = %e, "Failed to notify user"),
            }
        }
        info!(role = %role, kind = %kind, sent, "Role notified");
        Ok(sent)
    }

    /// 仅实时推送，不落库
    pub fn broadcast(
        &self,
        role: Option<Role>,
        kind: NotificationKind,
        title: &str,
        message: &str,
        reference_id: Option<Uuid>,
    ) -> usize {
        let recipient = match role {
            Some(role) => Recipient::Role(role),
            None => Recipient::Everyone,
        };
        let payload = json!({
            "kind": kind,
            "title": title,
            "message": message,
            "reference_id": reference_id,
        });
        let delivered = self.push(&recipient, NOTIFICATION_BROADCAST, payload);
        debug!(?recipient, kind = %kind, delivered, "Notification broadcast");
        delivered
    }

    pub async fn list(
        &self,
        user_id: &UserId,
        unread_only: bool,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<Notification>> {
        let mut filter = QueryFilter::new().eq("user_id", user_id);
        if unread_only {
            filter = filter.eq("is_read", false);
        }
        self.notifications.find_page(&filter, pagination).await
    }

    pub async fn unread_count(&self, user_id: &UserId) -> AppResult<u64> {
        let filter = QueryFilter::new().eq("user_id", user_id).eq("is_read", false);
        self.notifications.count(&filter).await
    }

    pub async fn mark_read(&self, user_id: &UserId, id: &NotificationId) -> AppResult<Notification> {
        let mut notification = self
            .notifications
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {} not found", id)))?;
        if !notification.belongs_to(user_id) {
            return Err(AppError::forbidden("This notification belongs to another user"));
        }

        let expected = notification.version();
        if notification.mark_read() {
            self.notifications.update(&notification, expected).await?;
        }
        Ok(notification)
    }

    /// 返回本次标记的数量；并发标记产生的冲突视为已读
    pub async fn mark_all_read(&self, user_id: &UserId) -> AppResult<u64> {
        let filter = QueryFilter::new().eq("user_id", user_id).eq("is_read", false);
        let unread = self.notifications.find_all(&filter).await?;

        let mut marked = 0;
        for mut notification in unread {
            let expected = notification.version();
            if !notification.mark_read() {
                continue;
            }
            match self.notifications.update(&notification, expected).await {
                Ok(()) => marked += 1,
                Err(AppError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }
        info!(user_id = %user_id, marked, "Notifications marked as read");
        Ok(marked)
    }
}
