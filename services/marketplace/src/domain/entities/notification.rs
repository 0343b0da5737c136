//! 站内通知实体

use handyhub_common::{AuditInfo, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::enums::NotificationKind;
use crate::domain::value_objects::NotificationId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    id: NotificationId,
    user_id: UserId,
    kind: NotificationKind,
    title: String,
    message: String,
    /// 关联的业务对象（需求、申请等）
    reference_id: Option<Uuid>,
    is_read: bool,
    audit_info: AuditInfo,
}

impl_document!(Notification, NotificationId, "notifications");

impl Notification {
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        reference_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            reference_id,
            is_read: false,
            audit_info: AuditInfo::new(None),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn reference_id(&self) -> Option<Uuid> {
        self.reference_id
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn belongs_to(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    /// 返回是否发生了变化
    pub fn mark_read(&mut self) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.audit_info.touch(Some(self.user_id.clone()));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_read_is_idempotent() {
        let user = UserId::new();
        let mut n = Notification::new(
            user.clone(),
            NotificationKind::System,
            "Welcome",
            "Hello",
            None,
        );
        assert!(!n.is_read());
        assert!(n.belongs_to(&user));

        assert!(n.mark_read());
        assert_eq!(n.audit_info.version, 2);
        assert!(!n.mark_read());
        assert_eq!(n.audit_info.version, 2);
    }
}
