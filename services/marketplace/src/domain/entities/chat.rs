//! 聊天会话与消息

use chrono::{DateTime, Utc};
use handyhub_common::utils::truncate_chars;
use handyhub_common::{AuditInfo, UserId};
use handyhub_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ChatMessageId, ConversationId, ServiceRequestId};

/// 单条消息最大字符数
pub const MAX_MESSAGE_CHARS: usize = 2000;

const PREVIEW_CHARS: usize = 100;

/// 两个用户之间的会话，可关联到某个服务需求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    /// 恰好两个不同用户，按 UUID 排序
    participants: Vec<UserId>,
    service_request_id: Option<ServiceRequestId>,
    last_message_at: Option<DateTime<Utc>>,
    last_message_preview: Option<String>,
    audit_info: AuditInfo,
}

impl_document!(Conversation, ConversationId, "conversations");

impl Conversation {
    pub fn new(
        initiator: UserId,
        other: UserId,
        service_request_id: Option<ServiceRequestId>,
    ) -> AppResult<Self> {
        if initiator == other {
            return Err(AppError::validation("Cannot start a conversation with yourself"));
        }
        let mut participants = vec![initiator.clone(), other];
        participants.sort_by_key(|u| u.0);

        Ok(Self {
            id: ConversationId::new(),
            participants,
            service_request_id,
            last_message_at: None,
            last_message_preview: None,
            audit_info: AuditInfo::new(Some(initiator)),
        })
    }

    pub fn participants(&self) -> &[UserId] {
        &self.participants
    }

    pub fn service_request_id(&self) -> Option<&ServiceRequestId> {
        self.service_request_id.as_ref()
    }

    pub fn last_message_at(&self) -> Option<DateTime<Utc>> {
        self.last_message_at
    }

    pub fn last_message_preview(&self) -> Option<&str> {
        self.last_message_preview.as_deref()
    }

    pub fn is_participant(&self, user_id: &UserId) -> bool {
        self.participants.contains(user_id)
    }

    pub fn ensure_participant(&self, user_id: &UserId) -> AppResult<()> {
        if self.is_participant(user_id) {
            Ok(())
        } else {
            Err(AppError::forbidden("You are not a participant of this conversation"))
        }
    }

    /// 对方用户；非参与者返回 None
    pub fn other_participant(&self, user_id: &UserId) -> Option<&UserId> {
        if !self.is_participant(user_id) {
            return None;
        }
        self.participants.iter().find(|p| *p != user_id)
    }

    /// 是否为同一对用户、同一需求下的会话
    pub fn connects(&self, a: &UserId, b: &UserId, service_request_id: Option<&ServiceRequestId>) -> bool {
        self.is_participant(a) && self.is_participant(b) && self.service_request_id.as_ref() == service_request_id
    }

    /// 更新最近消息摘要；比当前摘要更早的消息不覆盖，返回是否发生了变化
    pub fn record_message(&mut self, message: &ChatMessage) -> bool {
        let sent_at = message.sent_at();
        if self.last_message_at.is_some_and(|last| last > sent_at) {
            return false;
        }
        self.last_message_at = Some(sent_at);
        self.last_message_preview = Some(truncate_chars(message.content(), PREVIEW_CHARS));
        self.audit_info.touch(Some(message.sender_id.clone()));
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    id: ChatMessageId,
    conversation_id: ConversationId,
    sender_id: UserId,
    recipient_id: UserId,
    content: String,
    read_by_recipient: bool,
    audit_info: AuditInfo,
}

impl_document!(ChatMessage, ChatMessageId, "chat_messages");

impl ChatMessage {
    /// 发送者必须是会话参与者
    pub fn new(conversation: &Conversation, sender_id: UserId, content: &str) -> AppResult<Self> {
        let recipient_id = conversation
            .other_participant(&sender_id)
            .cloned()
            .ok_or_else(|| AppError::forbidden("You are not a participant of this conversation"))?;

        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Message content must not be empty"));
        }
        if content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::validation(format!(
                "Message content must be at most {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        Ok(Self {
            id: ChatMessageId::new(),
            conversation_id: conversation.id.clone(),
            sender_id: sender_id.clone(),
            recipient_id,
            content: content.to_string(),
            read_by_recipient: false,
            audit_info: AuditInfo::new(Some(sender_id)),
        })
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn sender_id(&self) -> &UserId {
        &self.sender_id
    }

    pub fn recipient_id(&self) -> &UserId {
        &self.recipient_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn read_by_recipient(&self) -> bool {
        self.read_by_recipient
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.audit_info.created_at
    }

    /// 返回是否发生了变化
    pub fn mark_read(&mut self) -> bool {
        if self.read_by_recipient {
            return false;
        }
        self.read_by_recipient = true;
        self.audit_info.touch(Some(self.recipient_id.clone()));
        true
    }
}
