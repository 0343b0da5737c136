//! 材料需求与供应商报价

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use handyhub_common::PagedResult;
use handyhub_errors::AppResult;

use crate::api::dto::{PageParams, StatusParams};
use crate::api::extractors::AuthUser;
use crate::api::state::AppState;
use crate::application::{
    BrowseRequestsQuery, CreateMaterialRequestCommand, SubmitQuoteCommand,
    UpdateMaterialRequestCommand,
};
use crate::domain::entities::{DistributorApplication, MaterialRequest};
use crate::domain::enums::{ApplicationStatus, RequestStatus};
use crate::domain::value_objects::{DistributorApplicationId, MaterialRequestId};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/material-requests", get(browse).post(create))
        .route("/api/material-requests/mine", get(list_mine))
        .route("/api/material-requests/{id}", get(get_one).put(update))
        .route("/api/material-requests/{id}/cancel", post(cancel))
        .route("/api/material-requests/{id}/complete", post(complete))
        .route(
            "/api/material-requests/{id}/quotes",
            get(list_quotes).post(submit_quote),
        )
        .route(
            "/api/material-requests/{id}/quotes/{quote_id}/accept",
            post(accept_quote),
        )
        .route(
            "/api/material-requests/{id}/quotes/{quote_id}/reject",
            post(reject_quote),
        )
        .route("/api/distributor-quotes/mine", get(list_my_quotes))
        .route("/api/distributor-quotes/{id}", delete(withdraw_quote))
}

async fn browse(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Query(query): Query<BrowseRequestsQuery>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<PagedResult<MaterialRequest>>> {
    let requests = state
        .facade
        .material_requests()
        .browse_open(query, &page.pagination())
        .await?;
    Ok(Json(requests))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(cmd): Json<CreateMaterialRequestCommand>,
) -> AppResult<(StatusCode, Json<MaterialRequest>)> {
    let request = state.facade.material_requests().create(&actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn list_mine(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(filter): Query<StatusParams<RequestStatus>>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<PagedResult<MaterialRequest>>> {
    let requests = state
        .facade
        .material_requests()
        .list_mine(&actor, filter.status, &page.pagination())
        .await?;
    Ok(Json(requests))
}

async fn get_one(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Path(id): Path<MaterialRequestId>,
) -> AppResult<Json<MaterialRequest>> {
    Ok(Json(state.facade.material_requests().get(&id).await?))
}

async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<MaterialRequestId>,
    Json(cmd): Json<UpdateMaterialRequestCommand>,
) -> AppResult<Json<MaterialRequest>> {
    Ok(Json(state.facade.material_requests().update(&actor, &id, cmd).await?))
}

async fn cancel(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<MaterialRequestId>,
) -> AppResult<Json<MaterialRequest>> {
    Ok(Json(state.facade.material_requests().cancel(&actor, &id).await?))
}

async fn complete(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<MaterialRequestId>,
) -> AppResult<Json<MaterialRequest>> {
    Ok(Json(state.facade.material_requests().complete(&actor, &id).await?))
}

async fn list_quotes(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<MaterialRequestId>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<PagedResult<DistributorApplication>>> {
    let quotes = state
        .facade
        .material_requests()
        .list_quotes(&actor, &id, &page.pagination())
        .await?;
    Ok(Json(quotes))
}

async fn submit_quote(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<MaterialRequestId>,
    Json(cmd): Json<SubmitQuoteCommand>,
) -> AppResult<(StatusCode, Json<DistributorApplication>)> {
    let quote = state.facade.material_requests().submit_quote(&actor, &id, cmd).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

async fn accept_quote(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((id, quote_id)): Path<(MaterialRequestId, DistributorApplicationId)>,
) -> AppResult<Json<MaterialRequest>> {
    let request = state
        .facade
        .material_requests()
        .accept_quote(&actor, &id, &quote_id)
        .await?;
    Ok(Json(request))
}

async fn reject_quote(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((id, quote_id)): Path<(MaterialRequestId, DistributorApplicationId)>,
) -> AppResult<Json<DistributorApplication>> {
    let quote = state
        .facade
        .material_requests()
        .reject_quote(&actor, &id, &quote_id)
        .await?;
    Ok(Json(quote))
}

async fn list_my_quotes(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(filter): Query<StatusParams<ApplicationStatus>>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<PagedResult<DistributorApplication>>> {
    let quotes = state
        .facade
        .material_requests()
        .list_my_quotes(&actor, filter.status, &page.pagination())
        .await?;
    Ok(Json(quotes))
}

async fn withdraw_quote(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DistributorApplicationId>,
) -> AppResult<StatusCode> {
    state.facade.material_requests().withdraw_quote(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
