//! 服务需求与承包商申请

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
    ApplyToServiceRequestCommand, BrowseRequestsQuery, CreateServiceRequestCommand,
    UpdateServiceRequestCommand,
};
use crate::domain::entities::{ContractorApplication, ServiceRequest};
use crate::domain::enums::{ApplicationStatus, RequestStatus};
use crate::domain::value_objects::{ContractorApplicationId, ServiceRequestId};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/service-requests", get(browse).post(create))
        .route("/api/service-requests/mine", get(list_mine))
        .route("/api/service-requests/{id}", get(get_one).put(update))
        .route("/api/service-requests/{id}/cancel", post(cancel))
        .route("/api/service-requests/{id}/complete", post(complete))
        .route(
            "/api/service-requests/{id}/applications",
            get(list_applications).post(apply),
        )
        .route(
            "/api/service-requests/{id}/applications/{application_id}/accept",
            post(accept_application),
        )
        .route(
            "/api/service-requests/{id}/applications/{application_id}/reject",
            post(reject_application),
        )
        .route("/api/contractor-applications/mine", get(list_my_applications))
        .route("/api/contractor-applications/{id}", delete(withdraw))
}

async fn browse(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Query(query): Query<BrowseRequestsQuery>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<PagedResult<ServiceRequest>>> {
    let requests = state
        .facade
        .service_requests()
        .browse_open(query, &page.pagination())
        .await?;
    Ok(Json(requests))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(cmd): Json<CreateServiceRequestCommand>,
) -> AppResult<(StatusCode, Json<ServiceRequest>)> {
    let request = state.facade.service_requests().create(&actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn list_mine(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(filter): Query<StatusParams<RequestStatus>>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<PagedResult<ServiceRequest>>> {
    let requests = state
        .facade
        .service_requests()
        .list_mine(&actor, filter.status, &page.pagination())
        .await?;
    Ok(Json(requests))
}

async fn get_one(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Path(id): Path<ServiceRequestId>,
) -> AppResult<Json<ServiceRequest>> {
    Ok(Json(state.facade.service_requests().get(&id).await?))
}

async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<ServiceRequestId>,
    Json(cmd): Json<UpdateServiceRequestCommand>,
) -> AppResult<Json<ServiceRequest>> {
    Ok(Json(state.facade.service_requests().update(&actor, &id, cmd).await?))
}

async fn cancel(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<ServiceRequestId>,
) -> AppResult<Json<ServiceRequest>> {
    Ok(Json(state.facade.service_requests().cancel(&actor, &id).await?))
}

async fn complete(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<ServiceRequestId>,
) -> AppResult<Json<ServiceRequest>> {
    Ok(Json(state.facade.service_requests().complete(&actor, &id).await?))
}

async fn list_applications(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<ServiceRequestId>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<PagedResult<ContractorApplication>>> {
    let applications = state
        .facade
        .service_requests()
        .list_applications(&actor, &id, &page.pagination())
        .await?;
    Ok(Json(applications))
}

async fn apply(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<ServiceRequestId>,
    Json(cmd): Json<ApplyToServiceRequestCommand>,
) -> AppResult<(StatusCode, Json<ContractorApplication>)> {
    let application = state.facade.service_requests().apply(&actor, &id, cmd).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

async fn accept_application(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((id, application_id)): Path<(ServiceRequestId, ContractorApplicationId)>,
) -> AppResult<Json<ServiceRequest>> {
    let request = state
        .facade
        .service_requests()
        .accept_application(&actor, &id, &application_id)
        .await?;
    Ok(Json(request))
}

async fn reject_application(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((id, application_id)): Path<(ServiceRequestId, ContractorApplicationId)>,
) -> AppResult<Json<ContractorApplication>> {
    let application = state
        .facade
        .service_requests()
        .reject_application(&actor, &id, &application_id)
        .await?;
    Ok(Json(application))
}

async fn list_my_applications(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(filter): Query<StatusParams<ApplicationStatus>>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<PagedResult<ContractorApplication>>> {
    let applications = state
        .facade
        .service_requests()
        .list_my_applications(&actor, filter.status, &page.pagination())
        .await?;
    Ok(Json(applications))
}

async fn withdraw(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<ContractorApplicationId>,
) -> AppResult<StatusCode> {
    state.facade.service_requests().withdraw(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
