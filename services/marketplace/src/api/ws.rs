//! WebSocket 实时通道
//!
//! 浏览器无法为 WebSocket 设置请求头，访问令牌通过 `?token=` 传递。

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use handyhub_errors::{AppError, AppResult};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::extractors::actor_from_token;
use super::state::AppState;
use crate::application::Actor;
use crate::infrastructure::RealtimeHub;

pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(websocket_handler))
}

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    #[serde(default)]
    pub token: Option<String>,
}

// 先鉴权再检查升级请求
async fn websocket_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> AppResult<Response> {
    let token = params
        .token
        .as_deref()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthenticated("Missing access token"))?;
    let actor = actor_from_token(&state.tokens, token)?;

    let hub = state.hub.clone();
    Ok(match ws {
        Ok(ws) => ws.on_upgrade(move |socket| handle_socket(socket, hub, actor)),
        Err(rejection) => rejection.into_response(),
    })
}

async fn handle_socket(socket: WebSocket, hub: Arc<RealtimeHub>, actor: Actor) {
    let mut subscription = hub.subscribe(actor.user_id.clone(), actor.role);
    let (mut sender, mut receiver) = socket.split();
    info!(user_id = %actor.user_id, connection_id = subscription.id(), "WebSocket connected");

    loop {
        tokio::select! {
            received = subscription.recv() => match received {
                Ok(message) => {
                    let text = match serde_json::to_string(&message) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(error = %e, event = %message.event, "Failed to encode realtime message");
                            continue;
                        }
                    };
                    if let Err(e) = sender.send(Message::Text(text.into())).await {
                        debug!(error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(user_id = %actor.user_id, skipped, "WebSocket client lagging, messages dropped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // 客户端消息仅用于保活
                Some(Ok(_)) => {}
            },
        }
    }

    info!(user_id = %actor.user_id, connection_id = subscription.id(), "WebSocket disconnected");
}
