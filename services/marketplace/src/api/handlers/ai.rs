//! AI 估价与建议

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use handyhub_errors::AppResult;

use crate::api::dto::TextResponse;
use crate::api::extractors::AuthUser;
use crate::api::state::AppState;
use crate::application::SearchSuggestionQuery;
use crate::domain::value_objects::{ConversationId, ServiceRequestId};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/ai/estimate/{id}", post(estimate_price))
        .route("/api/ai/search-suggestions", post(suggest_search))
        .route("/api/ai/chat-suggestions/{id}", post(chat_suggestions))
}

async fn estimate_price(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Path(id): Path<ServiceRequestId>,
) -> AppResult<Json<TextResponse>> {
    let text = state.facade.estimation().estimate_price(&id).await?;
    Ok(Json(TextResponse { text }))
}

async fn suggest_search(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Json(query): Json<SearchSuggestionQuery>,
) -> AppResult<Json<TextResponse>> {
    let text = state.facade.estimation().suggest_search(query).await?;
    Ok(Json(TextResponse { text }))
}

async fn chat_suggestions(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<ConversationId>,
) -> AppResult<Json<TextResponse>> {
    let text = state.facade.estimation().chat_suggestions(&actor, &id).await?;
    Ok(Json(TextResponse { text }))
}
