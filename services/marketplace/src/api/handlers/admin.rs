//! 管理后台：用户、入驻审批与广播

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use handyhub_auth_core::require_role;
use handyhub_common::{PagedResult, Role, UserId};
use handyhub_errors::AppResult;
use tracing::info;

use crate::api::dto::{BroadcastRequest, BroadcastResponse, PageParams, PartnerRequestResponse, UserResponse};
use crate::api::extractors::AuthUser;
use crate::api::state::AppState;
use crate::application::commands::require_text;
use crate::application::{
    ListPartnerRequestsQuery, ListUsersQuery, RejectPartnerRequestCommand, SetUserStatusCommand,
};
use crate::domain::enums::NotificationKind;
use crate::domain::value_objects::PartnerRequestId;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}/status", put(set_user_status))
        .route("/api/admin/partner-requests", get(list_partner_requests))
        .route("/api/admin/partner-requests/{id}", get(get_partner_request))
        .route("/api/admin/partner-requests/{id}/approve", post(approve_partner_request))
        .route("/api/admin/partner-requests/{id}/reject", post(reject_partner_request))
        .route("/api/admin/notifications/broadcast", post(broadcast))
}

async fn list_users(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ListUsersQuery>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<PagedResult<UserResponse>>> {
    let users = state
        .facade
        .users()
        .list_users(&actor, query, &page.pagination())
        .await?;
    Ok(Json(users.map(UserResponse::from)))
}

async fn set_user_status(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<UserId>,
    Json(cmd): Json<SetUserStatusCommand>,
) -> AppResult<Json<UserResponse>> {
    let user = state.facade.users().set_user_status(&actor, &id, cmd).await?;
    Ok(Json(user.into()))
}

async fn list_partner_requests(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ListPartnerRequestsQuery>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<PagedResult<PartnerRequestResponse>>> {
    let requests = state
        .facade
        .partners()
        .list(&actor, query, &page.pagination())
        .await?;
    Ok(Json(requests.map(PartnerRequestResponse::from)))
}

async fn get_partner_request(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<PartnerRequestId>,
) -> AppResult<Json<PartnerRequestResponse>> {
    let request = state.facade.partners().get(&actor, &id).await?;
    Ok(Json(request.into()))
}

async fn approve_partner_request(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<PartnerRequestId>,
) -> AppResult<Json<PartnerRequestResponse>> {
    let request = state.facade.partners().approve(&actor, &id).await?;
    Ok(Json(request.into()))
}

async fn reject_partner_request(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<PartnerRequestId>,
    Json(cmd): Json<RejectPartnerRequestCommand>,
) -> AppResult<Json<PartnerRequestResponse>> {
    let request = state.facade.partners().reject(&actor, &id, cmd).await?;
    Ok(Json(request.into()))
}

async fn broadcast(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(body): Json<BroadcastRequest>,
) -> AppResult<Json<BroadcastResponse>> {
    require_role!(actor, Role::Admin);
    require_text("title", &body.title, 200)?;
    require_text("message", &body.message, 2000)?;

    let kind = NotificationKind::System;
    let delivered = state.facade.notifications().broadcast(
        body.role,
        kind,
        body.title.trim(),
        body.message.trim(),
        None,
    );
    info!(admin_id = %actor.user_id, role = ?body.role, delivered, "Admin broadcast sent");
    Ok(Json(BroadcastResponse { kind, delivered }))
}
