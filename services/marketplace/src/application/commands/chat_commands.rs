//! 聊天命令

use handyhub_common::UserId;
use serde::Deserialize;

use crate::domain::value_objects::ServiceRequestId;

#[derive(Debug, Clone, Deserialize)]
pub struct StartConversationCommand {
    pub participant_id: UserId,
    #[serde(default)]
    pub service_request_id: Option<ServiceRequestId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageCommand {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSuggestionQuery {
    pub query: String,
}
