//! 服务需求与承包商申请

use std::sync::Arc;

use handyhub_auth_core::require_role;
use handyhub_common::{PagedResult, Pagination, Role};
use handyhub_domain_core::{AggregateRoot, Entity};
use handyhub_errors::{AppError, AppResult};
use handyhub_event_core::{EventBus, EventMetadata};
use handyhub_ports::{QueryFilter, Repository};
use tracing::info;

use super::commands::*;
use super::{Actor, metrics};
use crate::domain::entities::{ContractorApplication, ServiceRequest};
use crate::domain::enums::{ApplicationStatus, RequestStatus};
use crate::domain::events::MarketplaceEvent;
use crate::domain::value_objects::{ContractorApplicationId, ServiceRequestId};

const KIND: &str = "contractor";

pub struct ServiceRequestService {
    requests: Arc<dyn Repository<ServiceRequest>>,
    applications: Arc<dyn Repository<ContractorApplication>>,
    events: Arc<EventBus<MarketplaceEvent>>,
}

impl ServiceRequestService {
    pub fn new(
        requests: Arc<dyn Repository<ServiceRequest>>,
        applications: Arc<dyn Repository<ContractorApplication>>,
        events: Arc<EventBus<MarketplaceEvent>>,
    ) -> Self {
        Self {
            requests,
            applications,
            events,
        }
    }

    async fn publish(&self, actor: &Actor, event: MarketplaceEvent) {
        self.events
            .publish(event, EventMetadata::new().with_user(actor.user_id.to_string()))
            .await;
    }

    async fn load(&self, id: &ServiceRequestId) -> AppResult<ServiceRequest> {
        self.requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Service request {} not found", id)))
    }

    /// 加载属于该需求的申请
    async fn load_application(
        &self,
        request_id: &ServiceRequestId,
        id: &ContractorApplicationId,
    ) -> AppResult<ContractorApplication> {
        self.applications
            .find_by_id(id)
            .await?
            .filter(|app| app.service_request_id() == request_id)
            .ok_or_else(|| AppError::not_found(format!("Application {} not found", id)))
    }

    async fn pending_applications(
        &self,
        request_id: &ServiceRequestId,
    ) -> AppResult<Vec<ContractorApplication>> {
        let filter = QueryFilter::new()
            .eq("service_request_id", request_id)
            .eq("status", ApplicationStatus::Pending);
        self.applications.find_all(&filter).await
    }

    // ========== 客户操作 ==========

    pub async fn create(
        &self,
        actor: &Actor,
        cmd: CreateServiceRequestCommand,
    ) -> AppResult<ServiceRequest> {
        require_role!(actor, Role::Customer);
        cmd.validate()?;

        let request = ServiceRequest::new(
            actor.user_id.clone(),
            cmd.title.trim(),
            cmd.description.trim(),
            cmd.category.trim(),
            cmd.address.trim(),
            cmd.budget,
        );
        self.requests.insert(&request).await?;
        info!(request_id = %request.id(), customer_id = %actor.user_id, "Service request created");

        self.publish(
            actor,
            MarketplaceEvent::ServiceRequestCreated {
                request_id: request.id().clone(),
                customer_id: actor.user_id.clone(),
                title: request.title().to_string(),
                category: request.category().to_string(),
            },
        )
        .await;
        Ok(request)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: &ServiceRequestId,
        cmd: UpdateServiceRequestCommand,
    ) -> AppResult<ServiceRequest> {
        cmd.validate()?;
        let mut request = self.load(id).await?;
        request.ensure_owner(&actor.user_id)?;

        let expected = request.version();
        request.apply_changes(cmd.into_changes(), &actor.user_id)?;
        self.requests.update(&request, expected).await?;

        info!(request_id = %id, "Service request updated");
        Ok(request)
    }

    /// 取消需求，未处理的申请一并拒绝
    pub async fn cancel(&self, actor: &Actor, id: &ServiceRequestId) -> AppResult<ServiceRequest> {
        let mut request = self.load(id).await?;
        request.ensure_owner(&actor.user_id)?;

        let expected = request.version();
        request.cancel(&actor.user_id)?;
        self.requests.update(&request, expected).await?;

        let mut notified = Vec::new();
        for mut application in self.pending_applications(id).await? {
            let version = application.version();
            application.reject(&actor.user_id)?;
            self.applications.update(&application, version).await?;
            metrics::record_application(KIND, "rejected");
            notified.push(application.contractor_id().clone());
        }

        info!(request_id = %id, rejected = notified.len(), "Service request cancelled");
        self.publish(
            actor,
            MarketplaceEvent::ServiceRequestCancelled {
                request_id: id.clone(),
                title: request.title().to_string(),
                notified_contractors: notified,
            },
        )
        .await;
        Ok(request)
    }

    pub async fn complete(&self, actor: &Actor, id: &ServiceRequestId) -> AppResult<ServiceRequest> {
        let mut request = self.load(id).await?;
        request.ensure_owner(&actor.user_id)?;

        let expected = request.version();
        request.complete(&actor.user_id)?;
        self.requests.update(&request, expected).await?;

        info!(request_id = %id, "Service request completed");
        self.publish(
            actor,
            MarketplaceEvent::ServiceRequestCompleted {
                request_id: id.clone(),
                contractor_id: request.assigned_contractor_id().cloned(),
                title: request.title().to_string(),
            },
        )
        .await;
        Ok(request)
    }

    pub async fn list_mine(
        &self,
        actor: &Actor,
        status: Option<RequestStatus>,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<ServiceRequest>> {
        let filter = QueryFilter::new()
            .eq("customer_id", &actor.user_id)
            .eq_opt("status", status);
        self.requests.find_page(&filter, pagination).await
    }

    /// 选定一个申请：需求转为 Assigned，其余未处理申请全部拒绝
    pub async fn accept_application(
        &self,
        actor: &Actor,
        request_id: &ServiceRequestId,
        application_id: &ContractorApplicationId,
    ) -> AppResult<ServiceRequest> {
        let mut request = self.load(request_id).await?;
        request.ensure_owner(&actor.user_id)?;
        request.ensure_open()?;

        let mut chosen = self.load_application(request_id, application_id).await?;
        if !chosen.is_pending() {
            return Err(AppError::failed_precondition(format!(
                "Application is already {}",
                chosen.status()
            )));
        }

        // 需求的版本检查保证只有一个选定操作能成功
        let expected = request.version();
        request.assign(
            application_id.clone(),
            chosen.contractor_id().clone(),
            &actor.user_id,
        )?;
        self.requests.update(&request, expected).await?;

        let version = chosen.version();
        chosen.approve(&actor.user_id)?;
        self.applications.update(&chosen, version).await?;
        metrics::record_application(KIND, "approved");

        let mut rejected = Vec::new();
        for mut other in self.pending_applications(request_id).await? {
            let version = other.version();
            other.reject(&actor.user_id)?;
            self.applications.update(&other, version).await?;
            metrics::record_application(KIND, "rejected");
            rejected.push(other);
        }

        info!(
            request_id = %request_id,
            application_id = %application_id,
            contractor_id = %chosen.contractor_id(),
            rejected = rejected.len(),
            "Contractor application accepted"
        );

        self.publish(
            actor,
            MarketplaceEvent::ContractorApplicationAccepted {
                request_id: request_id.clone(),
                application_id: application_id.clone(),
                contractor_id: chosen.contractor_id().clone(),
                title: request.title().to_string(),
            },
        )
        .await;
        for other in rejected {
            self.publish(
                actor,
                MarketplaceEvent::ContractorApplicationRejected {
                    request_id: request_id.clone(),
                    application_id: other.id().clone(),
                    contractor_id: other.contractor_id().clone(),
                    title: request.title().to_string(),
                },
            )
            .await;
        }
        Ok(request)
    }

    pub async fn reject_application(
        &self,
        actor: &Actor,
        request_id: &ServiceRequestId,
        application_id: &ContractorApplicationId,
    ) -> AppResult<ContractorApplication> {
        let request = self.load(request_id).await?;
        request.ensure_owner(&actor.user_id)?;

        let mut application = self.load_application(request_id, application_id).await?;
        let expected = application.version();
        application.reject(&actor.user_id)?;
        self.applications.update(&application, expected).await?;
        metrics::record_application(KIND, "rejected");

        info!(request_id = %request_id, application_id = %application_id, "Contractor application rejected");
        self.publish(
            actor,
            MarketplaceEvent::ContractorApplicationRejected {
                request_id: request_id.clone(),
                application_id: application_id.clone(),
                contractor_id: application.contractor_id().clone(),
                title: request.title().to_string(),
            },
        )
        .await;
        Ok(application)
    }

    // ========== 承包商操作 ==========

    pub async fn browse_open(
        &self,
        query: BrowseRequestsQuery,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<ServiceRequest>> {
        let filter = QueryFilter::new()
            .eq("status", RequestStatus::Open)
            .eq_opt("category", query.category.as_deref().map(str::trim))
            .search(
                &["title", "description", "category", "address"],
                query.keyword.as_deref(),
            );
        self.requests.find_page(&filter, pagination).await
    }

    /// 同一承包商对同一需求只能申请一次
    pub async fn apply(
        &self,
        actor: &Actor,
        request_id: &ServiceRequestId,
        cmd: ApplyToServiceRequestCommand,
    ) -> AppResult<ContractorApplication> {
        require_role!(actor, Role::Contractor);
        cmd.validate()?;

        let request = self.load(request_id).await?;
        request.ensure_open()?;

        let existing = QueryFilter::new()
            .eq("service_request_id", request_id)
            .eq("contractor_id", &actor.user_id);
        if self.applications.count(&existing).await? > 0 {
            return Err(AppError::conflict("You have already applied to this request"));
        }

        let application = ContractorApplication::new(
            request_id.clone(),
            actor.user_id.clone(),
            cmd.message.trim(),
            cmd.estimated_price,
        );
        self.applications.insert(&application).await?;
        metrics::record_application(KIND, "submitted");

        info!(
            request_id = %request_id,
            application_id = %application.id(),
            contractor_id = %actor.user_id,
            "Contractor applied"
        );
        self.publish(
            actor,
            MarketplaceEvent::ContractorApplied {
                request_id: request_id.clone(),
                application_id: application.id().clone(),
                customer_id: request.customer_id().clone(),
                contractor_id: actor.user_id.clone(),
                title: request.title().to_string(),
            },
        )
        .await;
        Ok(application)
    }

    /// 撤回自己的待处理申请（直接删除）
    pub async fn withdraw(&self, actor: &Actor, application_id: &ContractorApplicationId) -> AppResult<()> {
        let application = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Application {} not found", application_id)))?;
        application.ensure_applicant(&actor.user_id)?;
        if !application.is_pending() {
            return Err(AppError::failed_precondition(format!(
                "Application is already {}",
                application.status()
            )));
        }

        self.applications.delete(application_id).await?;
        metrics::record_application(KIND, "withdrawn");
        info!(application_id = %application_id, "Contractor application withdrawn");
        Ok(())
    }

    pub async fn list_my_applications(
        &self,
        actor: &Actor,
        status: Option<ApplicationStatus>,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<ContractorApplication>> {
        let filter = QueryFilter::new()
            .eq("contractor_id", &actor.user_id)
            .eq_opt("status", status);
        self.applications.find_page(&filter, pagination).await
    }

    // ========== 公共查询 ==========

    pub async fn get(&self, id: &ServiceRequestId) -> AppResult<ServiceRequest> {
        self.load(id).await
    }

    /// 需求发布者和管理员看到全部申请，承包商只看到自己的
    pub async fn list_applications(
        &self,
        actor: &Actor,
        request_id: &ServiceRequestId,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<ContractorApplication>> {
        let request = self.load(request_id).await?;

        let mut filter = QueryFilter::new().eq("service_request_id", request_id);
        let sees_all = request.is_owned_by(&actor.user_id) || actor.is_admin();
        if !sees_all {
            if actor.role != Role::Contractor {
                return Err(AppError::forbidden(
                    "Only the customer who posted this request can view its applications",
                ));
            }
            filter = filter.eq("contractor_id", &actor.user_id);
        }
        self.applications.find_page(&filter, pagination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::InterleavedRepository;
    use handyhub_adapter_memory::InMemoryRepository;
    use handyhub_common::UserId;
    use handyhub_domain_core::Money;

    fn service() -> ServiceRequestService {
        ServiceRequestService::new(
            Arc::new(InMemoryRepository::<ServiceRequest>::new()),
            Arc::new(InMemoryRepository::<ContractorApplication>::new()),
            Arc::new(EventBus::new()),
        )
    }

    fn customer() -> Actor {
        Actor::new(UserId::new(), Role::Customer)
    }

    fn contractor() -> Actor {
        Actor::new(UserId::new(), Role::Contractor)
    }

    fn create_cmd(title: &str, category: &str) -> CreateServiceRequestCommand {
        CreateServiceRequestCommand {
            title: title.to_string(),
            description: "Details".to_string(),
            category: category.to_string(),
            address: "District 3".to_string(),
            budget: Some(Money::vnd(800_000)),
        }
    }

    fn apply_cmd(price: i64) -> ApplyToServiceRequestCommand {
        ApplyToServiceRequestCommand {
            message: "I can do it tomorrow".to_string(),
            estimated_price: Money::vnd(price),
        }
    }

    #[tokio::test]
    async fn test_only_customers_create_requests() {
        let svc = service();
        let result = svc.create(&contractor(), create_cmd("Fix sink", "Plumbing")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_duplicate_application_conflicts() {
        let svc = service();
        let owner = customer();
        let worker = contractor();
        let request = svc.create(&owner, create_cmd("Fix sink", "Plumbing")).await.unwrap();

        svc.apply(&worker, request.id(), apply_cmd(700_000)).await.unwrap();
        let again = svc.apply(&worker, request.id(), apply_cmd(650_000)).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_accept_assigns_and_rejects_others() {
        let svc = service();
        let owner = customer();
        let (a, b) = (contractor(), contractor());
        let request = svc.create(&owner, create_cmd("Paint wall", "Painting")).await.unwrap();

        let app_a = svc.apply(&a, request.id(), apply_cmd(1_000_000)).await.unwrap();
        let app_b = svc.apply(&b, request.id(), apply_cmd(900_000)).await.unwrap();

        // 非发布者不能选定
        let denied = svc.accept_application(&customer(), request.id(), app_b.id()).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let assigned = svc.accept_application(&owner, request.id(), app_b.id()).await.unwrap();
        assert_eq!(assigned.status(), RequestStatus::Assigned);
        assert_eq!(assigned.assigned_contractor_id(), Some(&b.user_id));

        let all = svc
            .list_applications(&owner, request.id(), &Pagination::default())
            .await
            .unwrap();
        for app in &all.items {
            let expected = if app.id() == app_b.id() {
                ApplicationStatus::Approved
            } else {
                ApplicationStatus::Rejected
            };
            assert_eq!(app.status(), expected);
        }
        assert!(all.items.iter().any(|app| app.id() == app_a.id()));

        // 已分配后不能再次选定，也不能再申请
        let again = svc.accept_application(&owner, request.id(), app_a.id()).await;
        assert!(matches!(again, Err(AppError::FailedPrecondition(_))));
        let late = svc.apply(&contractor(), request.id(), apply_cmd(1)).await;
        assert!(matches!(late, Err(AppError::FailedPrecondition(_))));

        let done = svc.complete(&owner, request.id()).await.unwrap();
        assert_eq!(done.status(), RequestStatus::Completed);
    }

    #[tokio::test]
    async fn test_concurrent_accepts_have_one_winner() {
        let requests = Arc::new(InterleavedRepository::<ServiceRequest>::new());
        let svc = ServiceRequestService::new(
            requests.clone(),
            Arc::new(InMemoryRepository::<ContractorApplication>::new()),
            Arc::new(EventBus::new()),
        );
        let owner = customer();
        let (a, b) = (contractor(), contractor());
        let request = svc.create(&owner, create_cmd("Fix gate", "Welding")).await.unwrap();
        let app_a = svc.apply(&a, request.id(), apply_cmd(500_000)).await.unwrap();
        let app_b = svc.apply(&b, request.id(), apply_cmd(450_000)).await.unwrap();

        // 两次选定都读到同一版本的需求
        requests.interleave_next_loads();
        let (first, second) = tokio::join!(
            svc.accept_application(&owner, request.id(), app_a.id()),
            svc.accept_application(&owner, request.id(), app_b.id()),
        );

        let outcomes = [first, second];
        let winners: Vec<&ServiceRequest> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| matches!(r, Err(AppError::Conflict(_))))
                .count(),
            1
        );

        let all = svc
            .list_applications(&owner, request.id(), &Pagination::default())
            .await
            .unwrap();
        let approved: Vec<_> = all
            .items
            .iter()
            .filter(|app| app.status() == ApplicationStatus::Approved)
            .collect();
        assert_eq!(approved.len(), 1);
        assert_eq!(Some(approved[0].id()), winners[0].selected_application_id());
        assert!(all.items.iter().all(|app| app.status() != ApplicationStatus::Pending));
    }

    #[tokio::test]
    async fn test_cancel_rejects_pending_applications() {
        let svc = service();
        let owner = customer();
        let worker = contractor();
        let request = svc.create(&owner, create_cmd("Fix roof", "Roofing")).await.unwrap();
        svc.apply(&worker, request.id(), apply_cmd(2_000_000)).await.unwrap();

        let cancelled = svc.cancel(&owner, request.id()).await.unwrap();
        assert_eq!(cancelled.status(), RequestStatus::Cancelled);

        let mine = svc
            .list_my_applications(&worker, Some(ApplicationStatus::Rejected), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(mine.total, 1);

        // 已取消的需求不能完成
        assert!(svc.complete(&owner, request.id()).await.is_err());
    }

    #[tokio::test]
    async fn test_contractor_sees_only_own_applications() {
        let svc = service();
        let owner = customer();
        let (a, b) = (contractor(), contractor());
        let request = svc.create(&owner, create_cmd("Fix sink", "Plumbing")).await.unwrap();
        svc.apply(&a, request.id(), apply_cmd(100_000)).await.unwrap();
        svc.apply(&b, request.id(), apply_cmd(120_000)).await.unwrap();

        let seen_by_a = svc
            .list_applications(&a, request.id(), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(seen_by_a.total, 1);
        assert_eq!(seen_by_a.items[0].contractor_id(), &a.user_id);

        let stranger = svc
            .list_applications(&customer(), request.id(), &Pagination::default())
            .await;
        assert!(matches!(stranger, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_withdraw_only_own_pending() {
        let svc = service();
        let owner = customer();
        let worker = contractor();
        let request = svc.create(&owner, create_cmd("Fix sink", "Plumbing")).await.unwrap();
        let app = svc.apply(&worker, request.id(), apply_cmd(100_000)).await.unwrap();

        let other = svc.withdraw(&contractor(), app.id()).await;
        assert!(matches!(other, Err(AppError::Forbidden(_))));

        svc.withdraw(&worker, app.id()).await.unwrap();
        let missing = svc.withdraw(&worker, app.id()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_browse_open_by_category_and_keyword() {
        let svc = service();
        let owner = customer();
        svc.create(&owner, create_cmd("Fix kitchen sink", "Plumbing")).await.unwrap();
        svc.create(&owner, create_cmd("Repaint bedroom", "Painting")).await.unwrap();
        let closed = svc.create(&owner, create_cmd("Fix bathroom sink", "Plumbing")).await.unwrap();
        svc.cancel(&owner, closed.id()).await.unwrap();

        let plumbing = svc
            .browse_open(
                BrowseRequestsQuery {
                    category: Some("Plumbing".to_string()),
                    keyword: None,
                },
                &Pagination::default(),
            )
            .await
            .unwrap();
        assert_eq!(plumbing.total, 1);

        let by_keyword = svc
            .browse_open(
                BrowseRequestsQuery {
                    category: None,
                    keyword: Some("BEDROOM".to_string()),
                },
                &Pagination::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_keyword.total, 1);
        assert_eq!(by_keyword.items[0].category(), "Painting");
    }
}
