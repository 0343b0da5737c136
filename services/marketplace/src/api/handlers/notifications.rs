//! 站内通知

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use handyhub_common::PagedResult;
use handyhub_errors::AppResult;

use crate::api::dto::{CountResponse, NotificationParams, PageParams};
use crate::api::extractors::AuthUser;
use crate::api::state::AppState;
use crate::domain::entities::Notification;
use crate::domain::value_objects::NotificationId;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list))
        .route("/api/notifications/unread-count", get(unread_count))
        .route("/api/notifications/read-all", post(mark_all_read))
        .route("/api/notifications/{id}/read", post(mark_read))
}

async fn list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(params): Query<NotificationParams>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<PagedResult<Notification>>> {
    let notifications = state
        .facade
        .notifications()
        .list(&actor.user_id, params.unread_only, &page.pagination())
        .await?;
    Ok(Json(notifications))
}

async fn unread_count(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> AppResult<Json<CountResponse>> {
    let count = state.facade.notifications().unread_count(&actor.user_id).await?;
    Ok(Json(CountResponse { count }))
}

async fn mark_read(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<NotificationId>,
) -> AppResult<Json<Notification>> {
    Ok(Json(state.facade.notifications().mark_read(&actor.user_id, &id).await?))
}

async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> AppResult<Json<CountResponse>> {
    let count = state.facade.notifications().mark_all_read(&actor.user_id).await?;
    Ok(Json(CountResponse { count }))
}
