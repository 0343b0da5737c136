//! 一对一聊天

use std::sync::Arc;

use handyhub_common::{PagedResult, Pagination};
use handyhub_domain_core::{AggregateRoot, Entity};
use handyhub_errors::{AppError, AppResult};
use handyhub_ports::{
    QueryFilter, RealtimeMessage, RealtimePublisher, Recipient, Repository, SortOrder,
};
use serde_json::json;
use tracing::{debug, info, warn};

use super::Actor;
use super::commands::*;
use crate::domain::entities::{ChatMessage, Conversation, User};
use crate::domain::value_objects::ConversationId;

pub const CHAT_MESSAGE: &str = "chat.message";
pub const CHAT_READ: &str = "chat.read";

/// 会话摘要更新遇到并发冲突时的最大尝试次数
const MAX_SUMMARY_ATTEMPTS: u32 = 3;

pub struct ChatService {
    conversations: Arc<dyn Repository<Conversation>>,
    messages: Arc<dyn Repository<ChatMessage>>,
    users: Arc<dyn Repository<User>>,
    realtime: Arc<dyn RealtimePublisher>,
}

impl ChatService {
    pub fn new(
        conversations: Arc<dyn Repository<Conversation>>,
        messages: Arc<dyn Repository<ChatMessage>>,
        users: Arc<dyn Repository<User>>,
        realtime: Arc<dyn RealtimePublisher>,
    ) -> Self {
        Self {
            conversations,
            messages,
            users,
            realtime,
        }
    }

    async fn load(&self, id: &ConversationId) -> AppResult<Conversation> {
        self.conversations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Conversation {} not found", id)))
    }

    async fn load_for(&self, actor: &Actor, id: &ConversationId) -> AppResult<Conversation> {
        let conversation = self.load(id).await?;
        conversation.ensure_participant(&actor.user_id)?;
        Ok(conversation)
    }

    /// 同一对用户、同一需求下复用已有会话
    pub async fn start_conversation(
        &self,
        actor: &Actor,
        cmd: StartConversationCommand,
    ) -> AppResult<Conversation> {
        if !self.users.exists(&cmd.participant_id).await? {
            return Err(AppError::not_found(format!("User {} not found", cmd.participant_id)));
        }

        let filter = QueryFilter::new()
            .contains("participants", &actor.user_id)
            .contains("participants", &cmd.participant_id)
            .sort(SortOrder::OldestFirst);
        let existing = self
            .conversations
            .find_all(&filter)
            .await?
            .into_iter()
            .find(|c| c.connects(&actor.user_id, &cmd.participant_id, cmd.service_request_id.as_ref()));
        if let Some(conversation) = existing {
            return Ok(conversation);
        }

        let conversation = Conversation::new(
            actor.user_id.clone(),
            cmd.participant_id.clone(),
            cmd.service_request_id,
        )?;
        self.conversations.insert(&conversation).await?;
        info!(
            conversation_id = %conversation.id(),
            initiator = %actor.user_id,
            participant = %cmd.participant_id,
            "Conversation started"
        );
        Ok(conversation)
    }

    pub async fn send_message(
        &self,
        actor: &Actor,
        conversation_id: &ConversationId,
        cmd: SendMessageCommand,
    ) -> AppResult<ChatMessage> {
        let conversation = self.load(conversation_id).await?;
        let message = ChatMessage::new(&conversation, actor.user_id.clone(), &cmd.content)?;
        self.messages.insert(&message).await?;
        // 消息已落库，摘要失败不能让调用方重发
        if let Err(e) = self.record_summary(conversation_id, &message).await {
            warn!(
                conversation_id = %conversation_id,
                message_id = %message.id(),
                error = %e,
                "Failed to update conversation summary"
            );
        }

        let payload = serde_json::to_value(&message)
            .map_err(|e| AppError::internal(format!("Failed to serialize message: {}", e)))?;
        let delivered = self.realtime.publish(
            &Recipient::User(message.recipient_id().clone()),
            RealtimeMessage::new(CHAT_MESSAGE, payload),
        );

        debug!(
            conversation_id = %conversation_id,
            message_id = %message.id(),
            delivered,
            "Chat message sent"
        );
        Ok(message)
    }

    /// 并发发送时会话版本可能已变化，重新加载后重试
    async fn record_summary(&self, id: &ConversationId, message: &ChatMessage) -> AppResult<()> {
        let mut attempt = 1;
        loop {
            let mut conversation = self.load(id).await?;
            let expected = conversation.version();
            if !conversation.record_message(message) {
                return Ok(());
            }
            match self.conversations.update(&conversation, expected).await {
                Ok(()) => return Ok(()),
                Err(AppError::Conflict(_)) if attempt < MAX_SUMMARY_ATTEMPTS => {
                    debug!(conversation_id = %id, attempt, "Retrying conversation summary update");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn list_conversations(
        &self,
        actor: &Actor,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<Conversation>> {
        let filter = QueryFilter::new().contains("participants", &actor.user_id);
        self.conversations.find_page(&filter, pagination).await
    }

    pub async fn get_conversation(&self, actor: &Actor, id: &ConversationId) -> AppResult<Conversation> {
        self.load_for(actor, id).await
    }

    /// 按发送时间正序分页
    pub async fn list_messages(
        &self,
        actor: &Actor,
        conversation_id: &ConversationId,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<ChatMessage>> {
        self.load_for(actor, conversation_id).await?;
        let filter = QueryFilter::new()
            .eq("conversation_id", conversation_id)
            .sort(SortOrder::OldestFirst);
        self.messages.find_page(&filter, pagination).await
    }

    /// 将对方发来的未读消息标记为已读，返回标记数量
    pub async fn mark_conversation_read(
        &self,
        actor: &Actor,
        conversation_id: &ConversationId,
    ) -> AppResult<u64> {
        let conversation = self.load_for(actor, conversation_id).await?;
        let filter = QueryFilter::new()
            .eq("conversation_id", conversation_id)
            .eq("recipient_id", &actor.user_id)
            .eq("read_by_recipient", false);

        let mut marked = 0;
        for mut message in self.messages.find_all(&filter).await? {
            let expected = message.version();
            if !message.mark_read() {
                continue;
            }
            match self.messages.update(&message, expected).await {
                Ok(()) => marked += 1,
                Err(AppError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }

        if marked > 0 {
            if let Some(other) = conversation.other_participant(&actor.user_id) {
                self.realtime.publish(
                    &Recipient::User(other.clone()),
                    RealtimeMessage::new(
                        CHAT_READ,
                        json!({ "conversation_id": conversation_id, "reader_id": actor.user_id, "count": marked }),
                    ),
                );
            }
        }
        Ok(marked)
    }

    /// 最近的若干条消息（按时间正序），用于生成回复建议
    pub async fn recent_messages(
        &self,
        actor: &Actor,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> AppResult<Vec<ChatMessage>> {
        self.load_for(actor, conversation_id).await?;
        let filter = QueryFilter::new().eq("conversation_id", conversation_id);
        let mut page = self
            .messages
            .find_page(&filter, &Pagination::new(1, limit))
            .await?
            .items;
        page.reverse();
        Ok(page)
    }
}
