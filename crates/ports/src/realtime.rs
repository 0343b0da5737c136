//! 实时推送端口

use chrono::{DateTime, Utc};
use handyhub_common::{Role, UserId};
use serde::Serialize;

/// 推送目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// 指定用户的所有在线连接
    User(UserId),
    /// 指定角色的所有在线用户
    Role(Role),
    /// 所有在线用户
    Everyone,
}

/// 推送消息
#[derive(Debug, Clone, Serialize)]
pub struct RealtimeMessage {
    /// 事件名，如 `notification.created`、`chat.message`
    pub event: String,
    pub payload: serde_json::Value,
    pub sent_at: DateTime<Utc>,
}

impl RealtimeMessage {
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            payload,
            sent_at: Utc::now(),
        }
    }
}

/// 实时推送 trait
pub trait RealtimePublisher: Send + Sync {
    /// 推送消息，返回实际送达的连接数
    fn publish(&self, recipient: &Recipient, message: RealtimeMessage) -> usize;
}
