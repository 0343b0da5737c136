//! AI 估价与搜索建议
//!
//! 只负责组装提示词，模型回复原样返回。

use std::sync::Arc;

use handyhub_adapter_llm::{LlmClient, LlmMessage};
use handyhub_errors::{AppError, AppResult};
use handyhub_ports::Repository;
use tracing::info;

use super::Actor;
use super::chat_service::ChatService;
use super::commands::SearchSuggestionQuery;
use crate::domain::entities::ServiceRequest;
use crate::domain::value_objects::{ConversationId, ServiceRequestId};

const MAX_QUERY_CHARS: usize = 500;
const SUGGESTION_CONTEXT_MESSAGES: u32 = 10;

const ESTIMATE_SYSTEM_PROMPT: &str = "You are a pricing assistant for a Vietnamese home-services \
marketplace. Estimate a fair price range in VND for the described job, list the main cost \
drivers, and keep the answer under 150 words.";

const SEARCH_SYSTEM_PROMPT: &str = "You help customers of a home-services marketplace find the \
right service. Suggest up to five short search phrases or service categories that match the \
user's need, one per line.";

const CHAT_SYSTEM_PROMPT: &str = "You suggest replies in a chat between a customer and a service \
provider on a home-services marketplace. Propose three short, polite replies the user could send \
next, one per line.";

pub struct EstimationService {
    llm: Option<Arc<dyn LlmClient>>,
    service_requests: Arc<dyn Repository<ServiceRequest>>,
    chat: Arc<ChatService>,
}

impl EstimationService {
    pub fn new(
        llm: Option<Arc<dyn LlmClient>>,
        service_requests: Arc<dyn Repository<ServiceRequest>>,
        chat: Arc<ChatService>,
    ) -> Self {
        Self {
            llm,
            service_requests,
            chat,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.llm.is_some()
    }

    fn client(&self) -> AppResult<&Arc<dyn LlmClient>> {
        self.llm
            .as_ref()
            .ok_or_else(|| AppError::external_service("AI assistant is not configured"))
    }

    pub async fn estimate_price(&self, id: &ServiceRequestId) -> AppResult<String> {
        let llm = self.client()?;
        let request = self
            .service_requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Service request {} not found", id)))?;

        let mut prompt = format!(
            "Category: {}\nTitle: {}\nDescription: {}\nLocation: {}",
            request.category(),
            request.title(),
            request.description(),
            request.address()
        );
        if let Some(budget) = request.budget() {
            prompt.push_str(&format!(
                "\nCustomer budget: {} {}",
                budget.amount, budget.currency.0
            ));
        }

        let reply = llm
            .complete(vec![
                LlmMessage::system(ESTIMATE_SYSTEM_PROMPT),
                LlmMessage::user(prompt),
            ])
            .await?;
        info!(request_id = %id, "Price estimate generated");
        Ok(reply)
    }

    pub async fn suggest_search(&self, query: SearchSuggestionQuery) -> AppResult<String> {
        let llm = self.client()?;
        let text = query.query.trim();
        if text.is_empty() {
            return Err(AppError::validation("query is required"));
        }
        if text.chars().count() > MAX_QUERY_CHARS {
            return Err(AppError::validation(format!(
                "query must be at most {} characters",
                MAX_QUERY_CHARS
            )));
        }

        llm.complete(vec![
            LlmMessage::system(SEARCH_SYSTEM_PROMPT),
            LlmMessage::user(text),
        ])
        .await
    }

    /// 基于最近的消息生成回复建议
    pub async fn chat_suggestions(&self, actor: &Actor, conversation_id: &ConversationId) -> AppResult<String> {
        let llm = self.client()?;
        let recent = self
            .chat
            .recent_messages(actor, conversation_id, SUGGESTION_CONTEXT_MESSAGES)
            .await?;
        if recent.is_empty() {
            return Err(AppError::failed_precondition("Conversation has no messages yet"));
        }

        let transcript = recent
            .iter()
            .map(|m| {
                let speaker = if m.sender_id() == &actor.user_id { "Me" } else { "Them" };
                format!("{}: {}", speaker, m.content())
            })
            .collect::<Vec<_>>()
            .join("\n");

        llm.complete(vec![
            LlmMessage::system(CHAT_SYSTEM_PROMPT),
            LlmMessage::user(transcript),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ChatMessage, Conversation, User};
    use handyhub_adapter_llm::MockLlmClient;
    use handyhub_adapter_memory::InMemoryRepository;
    use handyhub_common::{Role, UserId};
    use handyhub_domain_core::{Entity, Money};
    use handyhub_ports::{RealtimeMessage, RealtimePublisher, Recipient};

    struct Silent;

    impl RealtimePublisher for Silent {
        fn publish(&self, _recipient: &Recipient, _message: RealtimeMessage) -> usize {
            0
        }
    }

    fn chat() -> Arc<ChatService> {
        Arc::new(ChatService::new(
            Arc::new(InMemoryRepository::<Conversation>::new()),
            Arc::new(InMemoryRepository::<ChatMessage>::new()),
            Arc::new(InMemoryRepository::<User>::new()),
            Arc::new(Silent),
        ))
    }

    #[tokio::test]
    async fn test_disabled_without_client() {
        let svc = EstimationService::new(None, Arc::new(InMemoryRepository::new()), chat());
        assert!(!svc.is_enabled());
        let result = svc.estimate_price(&ServiceRequestId::new()).await;
        assert!(matches!(result, Err(AppError::ExternalService(_))));
    }

    #[tokio::test]
    async fn test_estimate_returns_reply_verbatim() {
        let requests = Arc::new(InMemoryRepository::<ServiceRequest>::new());
        let request = ServiceRequest::new(
            UserId::new(),
            "Replace water heater",
            "30L tank, wall mounted",
            "Plumbing",
            "Thu Duc",
            Some(Money::vnd(3_000_000)),
        );
        requests.insert(&request).await.unwrap();

        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .withf(|messages| {
                messages.len() == 2
                    && messages[1].content.contains("Replace water heater")
                    && messages[1].content.contains("3000000 VND")
            })
            .times(1)
            .returning(|_| Ok("  About 2.5M - 3.5M VND\n".to_string()));

        let svc = EstimationService::new(Some(Arc::new(llm)), requests, chat());
        let reply = svc.estimate_price(request.id()).await.unwrap();
        assert_eq!(reply, "  About 2.5M - 3.5M VND\n");
    }

    #[tokio::test]
    async fn test_suggest_search_validates_query() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete().times(0);
        let svc = EstimationService::new(Some(Arc::new(llm)), Arc::new(InMemoryRepository::new()), chat());

        let result = svc
            .suggest_search(SearchSuggestionQuery {
                query: "  ".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .returning(|_| Err(AppError::external_service("upstream 503")));
        let svc = EstimationService::new(Some(Arc::new(llm)), Arc::new(InMemoryRepository::new()), chat());

        let result = svc
            .suggest_search(SearchSuggestionQuery {
                query: "leaking roof".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::ExternalService(_))));
    }

    #[tokio::test]
    async fn test_chat_suggestions_unknown_conversation() {
        let llm = MockLlmClient::new();
        let svc = EstimationService::new(Some(Arc::new(llm)), Arc::new(InMemoryRepository::new()), chat());
        let actor = Actor::new(UserId::new(), Role::Customer);
        let result = svc.chat_suggestions(&actor, &ConversationId::new()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
