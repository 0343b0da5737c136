//! 注册、登录与令牌刷新

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use handyhub_auth_core::TokenPair;
use handyhub_errors::AppResult;

use crate::api::dto::{AuthResponse, UserResponse};
use crate::api::state::AppState;
use crate::application::{LoginCommand, RefreshTokenCommand, RegisterCustomerCommand};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
}

async fn register(
    State(state): State<AppState>,
    Json(cmd): Json<RegisterCustomerCommand>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state.facade.users().register_customer(cmd).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn login(
    State(state): State<AppState>,
    Json(cmd): Json<LoginCommand>,
) -> AppResult<Json<AuthResponse>> {
    let session = state.facade.users().login(cmd).await?;
    Ok(Json(session.into()))
}

async fn refresh(
    State(state): State<AppState>,
    Json(cmd): Json<RefreshTokenCommand>,
) -> AppResult<Json<TokenPair>> {
    Ok(Json(state.facade.users().refresh(cmd).await?))
}
