//! handyhub-adapter-llm - 大模型客户端
//!
//! 对接 OpenAI 兼容的 chat completions 接口（默认 Groq）。
//! 回复原样返回，不做任何本地加工。

mod client;

pub use client::ChatCompletionClient;

use handyhub_errors::AppResult;
use serde::{Deserialize, Serialize};

/// 对话角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    System,
    User,
    Assistant,
}

/// 单条对话消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }
}

/// 大模型客户端接口
#[mockall::automock]
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// 发送对话，返回模型的回复文本
    async fn complete(&self, messages: Vec<LlmMessage>) -> AppResult<String>;
}
