//! 端到端业务流程：门面 + 内存存储

use std::sync::{Arc, Mutex};

use handyhub_adapter_email::{EmailMessage, EmailTemplate, MockEmailSender};
use handyhub_adapter_llm::MockLlmClient;
use handyhub_auth_core::{TokenService, hash_password};
use handyhub_common::{Pagination, Role};
use handyhub_config::OtpConfig;
use handyhub_domain_core::{Entity, Money};
use handyhub_errors::AppError;
use handyhub_ports::RealtimePublisher;

use marketplace::application::*;
use marketplace::domain::enums::{ApplicationStatus, NotificationKind, PartnerRequestStatus, PartnerType, RequestStatus};
use marketplace::domain::value_objects::{ItemQuote, MaterialItem};
use marketplace::infrastructure::{RealtimeHub, Storage};

struct World {
    facade: MarketplaceFacade,
    hub: Arc<RealtimeHub>,
    outbox: Arc<Mutex<Vec<EmailMessage>>>,
}

fn world_with_llm(llm: Option<MockLlmClient>) -> World {
    let outbox = Arc::new(Mutex::new(Vec::new()));
    let captured = outbox.clone();
    let mut mailer = MockEmailSender::new();
    mailer.expect_send().returning(move |message| {
        captured.lock().unwrap().push(message);
        Ok(())
    });

    let hub = Arc::new(RealtimeHub::new(16));
    let facade = MarketplaceFacade::new(FacadeDependencies {
        repositories: Storage::Memory.repositories(),
        tokens: TokenService::new("workflow_secret", 3600, 7200, "handyhub", "handyhub-api"),
        mailer: Arc::new(mailer),
        templates: Arc::new(EmailTemplate::builtin().unwrap()),
        llm: llm.map(|client| Arc::new(client) as Arc<dyn handyhub_adapter_llm::LlmClient>),
        realtime: hub.clone() as Arc<dyn RealtimePublisher>,
        otp: OtpConfig::default(),
    });
    World { facade, hub, outbox }
}

fn world() -> World {
    world_with_llm(None)
}

async fn account(world: &World, email: &str, role: Role) -> Actor {
    let hash = hash_password("secret123").unwrap();
    let user = world
        .facade
        .users()
        .create_account(email, "Test User", None, role, &hash, None)
        .await
        .unwrap();
    Actor::new(user.id().clone(), role)
}

async fn customer(world: &World, email: &str) -> Actor {
    let user = world
        .facade
        .users()
        .register_customer(RegisterCustomerCommand {
            email: email.to_string(),
            password: "secret123".to_string(),
            full_name: "Lan Nguyen".to_string(),
            phone: Some("0901234567".to_string()),
        })
        .await
        .unwrap();
    Actor::new(user.id().clone(), Role::Customer)
}

fn page() -> Pagination {
    Pagination::default()
}

#[tokio::test]
async fn test_service_request_lifecycle() {
    let world = world();
    let customer = customer(&world, "lan@example.vn").await;
    let first = account(&world, "thanh@example.vn", Role::Contractor).await;
    let second = account(&world, "phuc@example.vn", Role::Contractor).await;

    // 在线承包商收到新需求广播
    let mut online = world.hub.subscribe(first.user_id.clone(), Role::Contractor);

    let requests = world.facade.service_requests();
    let request = requests
        .create(
            &customer,
            CreateServiceRequestCommand {
                title: "Fix leaking sink".to_string(),
                description: "Kitchen sink drips at night".to_string(),
                category: "Plumbing".to_string(),
                address: "12 Le Loi, District 1".to_string(),
                budget: Some(Money::vnd(500_000)),
            },
        )
        .await
        .unwrap();

    let pushed = online.recv().await.unwrap();
    assert_eq!(pushed.event, "notification.broadcast");
    assert_eq!(pushed.payload["kind"], "ServiceRequestCreated");

    let apply = |message: &str, price: i64| ApplyToServiceRequestCommand {
        message: message.to_string(),
        estimated_price: Money::vnd(price),
    };
    let chosen = requests.apply(&first, request.id(), apply("Can come today", 450_000)).await.unwrap();
    let other = requests.apply(&second, request.id(), apply("Tomorrow morning", 400_000)).await.unwrap();

    let duplicate = requests.apply(&first, request.id(), apply("Again", 1)).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    // 两次投标各产生一条客户通知
    assert_eq!(world.facade.notifications().unread_count(&customer.user_id).await.unwrap(), 2);

    let assigned = requests.accept_application(&customer, request.id(), chosen.id()).await.unwrap();
    assert_eq!(assigned.status(), RequestStatus::Assigned);
    assert_eq!(assigned.assigned_contractor_id(), Some(&first.user_id));

    let mine = requests.list_my_applications(&second, None, &page()).await.unwrap();
    assert_eq!(mine.items.len(), 1);
    assert_eq!(mine.items[0].id(), other.id());
    assert_eq!(mine.items[0].status(), ApplicationStatus::Rejected);

    // 已选定后不能再投标
    let late = account(&world, "late@example.vn", Role::Contractor).await;
    assert!(requests.apply(&late, request.id(), apply("Late", 100_000)).await.is_err());

    let completed = requests.complete(&customer, request.id()).await.unwrap();
    assert_eq!(completed.status(), RequestStatus::Completed);

    let notes = world.facade.notifications().list(&first.user_id, false, &page()).await.unwrap();
    let kinds: Vec<_> = notes.items.iter().map(|n| n.kind()).collect();
    assert!(kinds.contains(&NotificationKind::ApplicationAccepted));
    assert!(kinds.contains(&NotificationKind::ServiceRequestCompleted));

    let rejected = world.facade.notifications().list(&second.user_id, true, &page()).await.unwrap();
    assert_eq!(rejected.items.len(), 1);
    assert_eq!(rejected.items[0].kind(), NotificationKind::ApplicationRejected);
}

#[tokio::test]
async fn test_cancel_notifies_pending_applicants() {
    let world = world();
    let customer = customer(&world, "mai@example.vn").await;
    let contractor = account(&world, "hung@example.vn", Role::Contractor).await;
    let requests = world.facade.service_requests();

    let request = requests
        .create(
            &customer,
            CreateServiceRequestCommand {
                title: "Paint bedroom".to_string(),
                description: "Two walls".to_string(),
                category: "Painting".to_string(),
                address: "District 3".to_string(),
                budget: None,
            },
        )
        .await
        .unwrap();
    requests
        .apply(
            &contractor,
            request.id(),
            ApplyToServiceRequestCommand {
                message: "Available".to_string(),
                estimated_price: Money::vnd(1_200_000),
            },
        )
        .await
        .unwrap();

    let cancelled = requests.cancel(&customer, request.id()).await.unwrap();
    assert_eq!(cancelled.status(), RequestStatus::Cancelled);

    let notes = world.facade.notifications().list(&contractor.user_id, true, &page()).await.unwrap();
    assert_eq!(notes.items.len(), 1);
    assert_eq!(notes.items[0].kind(), NotificationKind::ServiceRequestCancelled);

    let open = requests.browse_open(BrowseRequestsQuery::default(), &page()).await.unwrap();
    assert_eq!(open.total, 0);
}

#[tokio::test]
async fn test_material_request_quotes() {
    let world = world();
    let requester = account(&world, "builder@example.vn", Role::Contractor).await;
    let distributor = account(&world, "supply@example.vn", Role::Distributor).await;
    let materials = world.facade.material_requests();

    let request = materials
        .create(
            &requester,
            CreateMaterialRequestCommand {
                title: "Cement and sand".to_string(),
                delivery_address: "Thu Duc".to_string(),
                items: vec![
                    MaterialItem::new("Cement", 10, "bag"),
                    MaterialItem::new("Sand", 2, "m3"),
                ],
            },
        )
        .await
        .unwrap();

    let quote = materials
        .submit_quote(
            &distributor,
            request.id(),
            SubmitQuoteCommand {
                message: "Delivery tomorrow".to_string(),
                quotes: vec![
                    ItemQuote {
                        item_index: 1,
                        unit_price: Money::vnd(300_000),
                    },
                    ItemQuote {
                        item_index: 0,
                        unit_price: Money::vnd(90_000),
                    },
                ],
            },
        )
        .await
        .unwrap();
    assert_eq!(quote.total(), &Money::vnd(1_500_000));

    // 已有报价时不能修改清单
    let change = materials
        .update(
            &requester,
            request.id(),
            UpdateMaterialRequestCommand {
                items: Some(vec![MaterialItem::new("Cement", 20, "bag")]),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(change, Err(AppError::FailedPrecondition(_))));

    let assigned = materials.accept_quote(&requester, request.id(), quote.id()).await.unwrap();
    assert_eq!(assigned.status(), RequestStatus::Assigned);
    assert_eq!(assigned.assigned_distributor_id(), Some(&distributor.user_id));

    let received = world.facade.notifications().list(&requester.user_id, false, &page()).await.unwrap();
    assert!(received.items.iter().any(|n| n.kind() == NotificationKind::QuoteReceived));
    let accepted = world.facade.notifications().list(&distributor.user_id, false, &page()).await.unwrap();
    assert!(accepted.items.iter().any(|n| n.kind() == NotificationKind::QuoteAccepted));
}

#[tokio::test]
async fn test_partner_onboarding_end_to_end() {
    let world = world();
    let admin = account(&world, "admin@example.vn", Role::Admin).await;
    let partners = world.facade.partners();

    let submission = partners
        .submit(SubmitPartnerRequestCommand {
            email: "Owner@Acme.vn".to_string(),
            password: "partner123".to_string(),
            company_name: "Acme Build".to_string(),
            contact_name: "Minh Tran".to_string(),
            phone: "0903123456".to_string(),
            partner_type: PartnerType::Contractor,
            description: Some("Renovation crew".to_string()),
        })
        .await
        .unwrap();
    assert!(submission.email_sent);
    assert_eq!(submission.request.status(), PartnerRequestStatus::PendingVerification);

    let code = {
        let outbox = world.outbox.lock().unwrap();
        let body = outbox.last().unwrap().text_body.clone();
        body.split(|c: char| !c.is_ascii_digit())
            .find(|part| part.len() == 6)
            .unwrap()
            .to_string()
    };

    let verified = partners
        .verify_otp(VerifyOtpCommand {
            email: "owner@acme.vn".to_string(),
            code,
        })
        .await
        .unwrap();
    assert_eq!(verified.status(), PartnerRequestStatus::Pending);

    // 验证通过后管理员收到待审批通知
    let admin_notes = world.facade.notifications().list(&admin.user_id, true, &page()).await.unwrap();
    assert_eq!(admin_notes.items.len(), 1);
    assert_eq!(admin_notes.items[0].kind(), NotificationKind::PartnerRequestSubmitted);

    let approved = partners.approve(&admin, verified.id()).await.unwrap();
    assert_eq!(approved.status(), PartnerRequestStatus::Approved);

    let session = world
        .facade
        .users()
        .login(LoginCommand {
            email: "owner@acme.vn".to_string(),
            password: "partner123".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(session.user.role(), Role::Contractor);
    assert_eq!(approved.user_id(), Some(session.user.id()));
}

#[tokio::test]
async fn test_chat_between_customer_and_contractor() {
    let mut llm = MockLlmClient::new();
    llm.expect_complete()
        .withf(|messages| messages[1].content.contains("Me: When can you come?"))
        .returning(|_| Ok("Tomorrow at 9am works.".to_string()));
    let world = world_with_llm(Some(llm));

    let customer = customer(&world, "hoa@example.vn").await;
    let contractor = account(&world, "tuan@example.vn", Role::Contractor).await;
    let chat = world.facade.chat();

    let conversation = chat
        .start_conversation(
            &customer,
            StartConversationCommand {
                participant_id: contractor.user_id.clone(),
                service_request_id: None,
            },
        )
        .await
        .unwrap();
    let again = chat
        .start_conversation(
            &contractor,
            StartConversationCommand {
                participant_id: customer.user_id.clone(),
                service_request_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(again.id(), conversation.id());

    let mut inbox = world.hub.subscribe(contractor.user_id.clone(), Role::Contractor);
    chat.send_message(
        &customer,
        conversation.id(),
        SendMessageCommand {
            content: "When can you come?".to_string(),
        },
    )
    .await
    .unwrap();

    let pushed = inbox.recv().await.unwrap();
    assert_eq!(pushed.event, "chat.message");

    let read = chat.mark_conversation_read(&contractor, conversation.id()).await.unwrap();
    assert_eq!(read, 1);

    let outsider = customer_outsider(&world).await;
    let denied = chat.list_messages(&outsider, conversation.id(), &page()).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let suggestion = world
        .facade
        .estimation()
        .chat_suggestions(&customer, conversation.id())
        .await
        .unwrap();
    assert_eq!(suggestion, "Tomorrow at 9am works.");
}

async fn customer_outsider(world: &World) -> Actor {
    customer(world, "outsider@example.vn").await
}
