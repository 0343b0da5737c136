//! 当前用户资料

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use handyhub_errors::AppResult;

use crate::api::dto::UserResponse;
use crate::api::extractors::AuthUser;
use crate::api::state::AppState;
use crate::application::UpdateProfileCommand;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/users/me", get(get_me).put(update_me))
}

async fn get_me(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> AppResult<Json<UserResponse>> {
    let user = state.facade.users().get_profile(&actor.user_id).await?;
    Ok(Json(user.into()))
}

async fn update_me(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(cmd): Json<UpdateProfileCommand>,
) -> AppResult<Json<UserResponse>> {
    let user = state.facade.users().update_profile(&actor, cmd).await?;
    Ok(Json(user.into()))
}
