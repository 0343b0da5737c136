//! 请求提取器

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use handyhub_auth_core::TokenService;
use handyhub_errors::{AppError, AppResult};
use tracing::debug;

use crate::application::Actor;

/// 已认证的调用者（`Authorization: Bearer <access token>`）
#[derive(Debug, Clone)]
pub struct AuthUser(pub Actor);

/// 校验访问令牌并还原操作者
pub fn actor_from_token(tokens: &TokenService, token: &str) -> AppResult<Actor> {
    let claims = tokens.validate_access_token(token)?;
    Ok(Actor::new(claims.user_id()?, claims.role))
}

fn bearer_token(parts: &Parts) -> AppResult<&str> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthenticated("Missing authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthenticated("Authorization header must use the Bearer scheme"))
}

impl<S> FromRequestParts<S> for AuthUser
where
    TokenService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let tokens = TokenService::from_ref(state);
        let actor = actor_from_token(&tokens, token)?;
        debug!(user_id = %actor.user_id, role = %actor.role, "Request authenticated");
        Ok(AuthUser(actor))
    }
}
