//! 聊天会话与消息

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use handyhub_common::PagedResult;
use handyhub_errors::AppResult;

use crate::api::dto::{CountResponse, PageParams};
use crate::api::extractors::AuthUser;
use crate::api::state::AppState;
use crate::application::{SendMessageCommand, StartConversationCommand};
use crate::domain::entities::{ChatMessage, Conversation};
use crate::domain::value_objects::ConversationId;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/conversations", get(list_conversations).post(start_conversation))
        .route("/api/conversations/{id}", get(get_conversation))
        .route(
            "/api/conversations/{id}/messages",
            get(list_messages).post(send_message),
        )
        .route("/api/conversations/{id}/read", post(mark_read))
}

async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(page): Query<PageParams>,
) -> AppResult<Json<PagedResult<Conversation>>> {
    let conversations = state
        .facade
        .chat()
        .list_conversations(&actor, &page.pagination())
        .await?;
    Ok(Json(conversations))
}

async fn start_conversation(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(cmd): Json<StartConversationCommand>,
) -> AppResult<Json<Conversation>> {
    Ok(Json(state.facade.chat().start_conversation(&actor, cmd).await?))
}

async fn get_conversation(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<ConversationId>,
) -> AppResult<Json<Conversation>> {
    Ok(Json(state.facade.chat().get_conversation(&actor, &id).await?))
}

async fn list_messages(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<ConversationId>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<PagedResult<ChatMessage>>> {
    let messages = state
        .facade
        .chat()
        .list_messages(&actor, &id, &page.pagination())
        .await?;
    Ok(Json(messages))
}

async fn send_message(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<ConversationId>,
    Json(cmd): Json<SendMessageCommand>,
) -> AppResult<(StatusCode, Json<ChatMessage>)> {
    let message = state.facade.chat().send_message(&actor, &id, cmd).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn mark_read(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<ConversationId>,
) -> AppResult<Json<CountResponse>> {
    let count = state.facade.chat().mark_conversation_read(&actor, &id).await?;
    Ok(Json(CountResponse { count }))
}
