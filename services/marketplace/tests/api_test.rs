//! HTTP 接口测试（内存存储，逐个请求 oneshot）

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use handyhub_adapter_email::{EmailTemplate, LoggingEmailSender};
use handyhub_auth_core::{TokenService, hash_password};
use handyhub_common::{Role, UserId};
use handyhub_config::{OtpConfig, ServerConfig};
use handyhub_domain_core::Entity;
use serde_json::{Value, json};
use tower::ServiceExt;

use marketplace::api::{AppState, router};
use marketplace::application::{FacadeDependencies, MarketplaceFacade};
use marketplace::infrastructure::{RealtimeHub, Storage};

fn state() -> AppState {
    let tokens = TokenService::new("api_test_secret", 3600, 7200, "handyhub", "handyhub-api");
    let hub = Arc::new(RealtimeHub::new(16));
    let storage = Storage::Memory;
    let facade = MarketplaceFacade::new(FacadeDependencies {
        repositories: storage.repositories(),
        tokens: tokens.clone(),
        mailer: Arc::new(LoggingEmailSender::new()),
        templates: Arc::new(EmailTemplate::builtin().unwrap()),
        llm: None,
        realtime: hub.clone(),
        otp: OtpConfig::default(),
    });
    AppState {
        facade,
        tokens,
        hub,
        storage,
        metrics: None,
    }
}

fn app(state: &AppState) -> Router {
    let server = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_allowed_origins: vec![],
        request_timeout_secs: 5,
        max_body_bytes: 64 * 1024,
    };
    router(state.clone(), &server)
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn token_for(state: &AppState, email: &str, role: Role) -> (UserId, String) {
    let hash = hash_password("secret123").unwrap();
    let user = state
        .facade
        .users()
        .create_account(email, "Partner", None, role, &hash, None)
        .await
        .unwrap();
    let token = state.tokens.generate_access_token(user.id(), role).unwrap();
    (user.id().clone(), token)
}

#[tokio::test]
async fn test_health_and_ready() {
    let state = state();
    let app = app(&state);

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, "GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["healthy"], true);
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let state = state();
    let app = app(&state);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "lan@example.vn",
            "password": "secret123",
            "full_name": "Lan Nguyen"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "Customer");
    assert!(body.get("password_hash").is_none());

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "LAN@example.vn", "password": "secret123", "full_name": "Dup" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "lan@example.vn", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap().to_string();
    assert_eq!(body["token_type"], "Bearer");

    let (status, body) = send(&app, "GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "lan@example.vn");

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "lan@example.vn", "password": "wrong-pass1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_token_returns_problem_details() {
    let state = state();
    let app = app(&state);

    let (status, body) = send(&app, "GET", "/api/notifications", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
    assert_eq!(body["title"], "Unauthenticated");
}

#[tokio::test]
async fn test_service_request_flow_over_http() {
    let state = state();
    let app = app(&state);
    let (_, customer) = token_for(&state, "mai@example.vn", Role::Customer).await;
    let (_, contractor) = token_for(&state, "hung@example.vn", Role::Contractor).await;

    let create = json!({
        "title": "Install ceiling fan",
        "description": "Living room, wiring exists",
        "category": "Electrical",
        "address": "District 7",
        "budget": { "amount": 300000, "currency": "VND" }
    });

    let (status, _) = send(&app, "POST", "/api/service-requests", Some(&contractor), Some(create.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, request) = send(&app, "POST", "/api/service-requests", Some(&customer), Some(create)).await;
    assert_eq!(status, StatusCode::CREATED);
    let request_id = request["id"].as_str().unwrap().to_string();

    let (status, open) = send(&app, "GET", "/api/service-requests?keyword=fan", Some(&contractor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(open["total"], 1);

    let (status, application) = send(
        &app,
        "POST",
        &format!("/api/service-requests/{}/applications", request_id),
        Some(&contractor),
        Some(json!({
            "message": "I can do it this afternoon",
            "estimated_price": { "amount": 280000, "currency": "VND" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let application_id = application["id"].as_str().unwrap().to_string();

    let (status, assigned) = send(
        &app,
        "POST",
        &format!(
            "/api/service-requests/{}/applications/{}/accept",
            request_id, application_id
        ),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["status"], "Assigned");

    let (status, count) = send(&app, "GET", "/api/notifications/unread-count", Some(&contractor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count["count"], 1);

    let (status, mine) = send(&app, "GET", "/api/service-requests/mine?status=Assigned", Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["total"], 1);
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let state = state();
    let app = app(&state);
    let (_, customer) = token_for(&state, "cus@example.vn", Role::Customer).await;
    let (_, admin) = token_for(&state, "root@example.vn", Role::Admin).await;

    let (status, _) = send(&app, "GET", "/api/admin/users", Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, users) = send(&app, "GET", "/api/admin/users?role=Customer", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users["total"], 1);

    let (status, body) = send(
        &app,
        "POST",
        "/api/admin/notifications/broadcast",
        Some(&admin),
        Some(json!({ "title": "Maintenance", "message": "Tonight 23:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delivered"], 0);
}

#[tokio::test]
async fn test_estimate_without_llm_is_bad_gateway() {
    let state = state();
    let app = app(&state);
    let (_, customer) = token_for(&state, "ai@example.vn", Role::Customer).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/ai/search-suggestions",
        Some(&customer),
        Some(json!({ "query": "leaking roof" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], 502);
}

#[tokio::test]
async fn test_partner_submission_is_public() {
    let state = state();
    let app = app(&state);

    let (status, body) = send(
        &app,
        "POST",
        "/api/partner-requests",
        None,
        Some(json!({
            "email": "supply@acme.vn",
            "password": "partner123",
            "company_name": "Acme Supply",
            "contact_name": "Binh",
            "phone": "0903123456",
            "partner_type": "Distributor"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email_sent"], true);
    assert_eq!(body["request"]["status"], "PendingVerification");
    assert!(body["request"].get("password_hash").is_none());

    let (status, _) = send(
        &app,
        "POST",
        "/api/partner-requests/verify",
        None,
        Some(json!({ "email": "supply@acme.vn", "code": "000000x" })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_websocket_requires_token_before_upgrade() {
    let state = state();
    let app = app(&state);

    let (status, body) = send(&app, "GET", "/ws", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["title"], "Unauthenticated");

    let (status, body) = send(&app, "GET", "/ws?token=not-a-jwt", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let state = state();
    let app = app(&state);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "big@example.vn",
            "password": "secret123",
            "full_name": "x".repeat(100 * 1024)
        })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
