//! 合作伙伴入驻（公开接口）

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use handyhub_errors::AppResult;

use crate::api::dto::{PartnerRequestResponse, PartnerSubmissionResponse};
use crate::api::state::AppState;
use crate::application::{ResendOtpCommand, SubmitPartnerRequestCommand, VerifyOtpCommand};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/partner-requests", post(submit))
        .route("/api/partner-requests/verify", post(verify))
        .route("/api/partner-requests/resend-otp", post(resend_otp))
}

async fn submit(
    State(state): State<AppState>,
    Json(cmd): Json<SubmitPartnerRequestCommand>,
) -> AppResult<(StatusCode, Json<PartnerSubmissionResponse>)> {
    let submission = state.facade.partners().submit(cmd).await?;
    Ok((StatusCode::CREATED, Json(submission.into())))
}

async fn verify(
    State(state): State<AppState>,
    Json(cmd): Json<VerifyOtpCommand>,
) -> AppResult<Json<PartnerRequestResponse>> {
    let request = state.facade.partners().verify_otp(cmd).await?;
    Ok(Json(request.into()))
}

async fn resend_otp(
    State(state): State<AppState>,
    Json(cmd): Json<ResendOtpCommand>,
) -> AppResult<StatusCode> {
    state.facade.partners().resend_otp(cmd).await?;
    Ok(StatusCode::ACCEPTED)
}
