//! OpenAI 兼容的 HTTP 客户端

use crate::{LlmClient, LlmMessage};
use handyhub_config::LlmConfig;
use handyhub_errors::{AppError, AppResult};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [LlmMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// chat completions 客户端
pub struct ChatCompletionClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl ChatCompletionClient {
    pub fn new(config: LlmConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create LLM HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

/// 取第一条候选回复
fn extract_reply(body: &str) -> AppResult<String> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| AppError::external_service(format!("Malformed LLM response: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AppError::external_service("LLM returned no choices"))
}

#[async_trait::async_trait]
impl LlmClient for ChatCompletionClient {
    async fn complete(&self, messages: Vec<LlmMessage>) -> AppResult<String> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages: &messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(model = %self.config.model, messages = messages.len(), "Calling LLM");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::external_service(format!("LLM request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::external_service(format!("Failed to read LLM response: {}", e)))?;

        if !status.is_success() {
            warn!(status = %status, "LLM request rejected");
            let snippet: String = body.chars().take(200).collect();
            return Err(AppError::external_service(format!(
                "LLM returned {}: {}",
                status, snippet
            )));
        }

        extract_reply(&body)
    }
}
