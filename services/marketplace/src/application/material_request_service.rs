//! 材料需求与供应商报价

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
use crate::domain::entities::{DistributorApplication, MaterialRequest};
use crate::domain::enums::{ApplicationStatus, RequestStatus};
use crate::domain::events::MarketplaceEvent;
use crate::domain::value_objects::{DistributorApplicationId, MaterialItem, MaterialRequestId};

const KIND: &str = "distributor";

pub struct MaterialRequestService {
    requests: Arc<dyn Repository<MaterialRequest>>,
    applications: Arc<dyn Repository<DistributorApplication>>,
    events: Arc<EventBus<MarketplaceEvent>>,
}

impl MaterialRequestService {
    pub fn new(
        requests: Arc<dyn Repository<MaterialRequest>>,
        applications: Arc<dyn Repository<DistributorApplication>>,
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

    async fn load(&self, id: &MaterialRequestId) -> AppResult<MaterialRequest> {
        self.requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Material request {} not found", id)))
    }

    async fn load_quote(
        &self,
        request_id: &MaterialRequestId,
        id: &DistributorApplicationId,
    ) -> AppResult<DistributorApplication> {
        self.applications
            .find_by_id(id)
            .await?
            .filter(|app| app.material_request_id() == request_id)
            .ok_or_else(|| AppError::not_found(format!("Quote {} not found", id)))
    }

    async fn pending_quotes(&self, request_id: &MaterialRequestId) -> AppResult<Vec<DistributorApplication>> {
        let filter = QueryFilter::new()
            .eq("material_request_id", request_id)
            .eq("status", ApplicationStatus::Pending);
        self.applications.find_all(&filter).await
    }

    // ========== 需求方操作 ==========

    pub async fn create(
        &self,
        actor: &Actor,
        cmd: CreateMaterialRequestCommand,
    ) -> AppResult<MaterialRequest> {
        require_role!(actor, Role::Customer, Role::Contractor);
        cmd.validate()?;

        let items = cmd
            .items
            .into_iter()
            .map(|item| MaterialItem::new(item.name.trim(), item.quantity, item.unit.trim()))
            .collect();
        let request = MaterialRequest::new(
            actor.user_id.clone(),
            cmd.title.trim(),
            cmd.delivery_address.trim(),
            items,
        )?;
        self.requests.insert(&request).await?;
        info!(
            request_id = %request.id(),
            requester_id = %actor.user_id,
            items = request.items().len(),
            "Material request created"
        );

        self.publish(
            actor,
            MarketplaceEvent::MaterialRequestCreated {
                request_id: request.id().clone(),
                requester_id: actor.user_id.clone(),
                title: request.title().to_string(),
            },
        )
        .await;
        Ok(request)
    }

    /// 替换清单时已有报价与新清单不再对应，因此要求尚无待处理报价
    pub async fn update(
        &self,
        actor: &Actor,
        id: &MaterialRequestId,
        cmd: UpdateMaterialRequestCommand,
    ) -> AppResult<MaterialRequest> {
        cmd.validate()?;
        let mut request = self.load(id).await?;
        request.ensure_owner(&actor.user_id)?;

        if cmd.items.is_some() && !self.pending_quotes(id).await?.is_empty() {
            return Err(AppError::failed_precondition(
                "Items cannot be changed once distributors have quoted",
            ));
        }

        let expected = request.version();
        request.apply_changes(
            cmd.title.map(|s| s.trim().to_string()),
            cmd.delivery_address.map(|s| s.trim().to_string()),
            cmd.items,
            &actor.user_id,
        )?;
        self.requests.update(&request, expected).await?;

        info!(request_id = %id, "Material request updated");
        Ok(request)
    }

    pub async fn cancel(&self, actor: &Actor, id: &MaterialRequestId) -> AppResult<MaterialRequest> {
        let mut request = self.load(id).await?;
        request.ensure_owner(&actor.user_id)?;

        let expected = request.version();
        request.cancel(&actor.user_id)?;
        self.requests.update(&request, expected).await?;

        let mut notified = Vec::new();
        for mut quote in self.pending_quotes(id).await? {
            let version = quote.version();
            quote.reject(&actor.user_id)?;
            self.applications.update(&quote, version).await?;
            metrics::record_application(KIND, "rejected");
            notified.push(quote.distributor_id().clone());
        }

        info!(request_id = %id, rejected = notified.len(), "Material request cancelled");
        self.publish(
            actor,
            MarketplaceEvent::MaterialRequestCancelled {
                request_id: id.clone(),
                title: request.title().to_string(),
                notified_distributors: notified,
            },
        )
        .await;
        Ok(request)
    }

    pub async fn complete(&self, actor: &Actor, id: &MaterialRequestId) -> AppResult<MaterialRequest> {
        let mut request = self.load(id).await?;
        request.ensure_owner(&actor.user_id)?;

        let expected = request.version();
        request.complete(&actor.user_id)?;
        self.requests.update(&request, expected).await?;

        info!(request_id = %id, "Material request completed");
        self.publish(
            actor,
            MarketplaceEvent::MaterialRequestCompleted {
                request_id: id.clone(),
                distributor_id: request.assigned_distributor_id().cloned(),
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
    ) -> AppResult<PagedResult<MaterialRequest>> {
        let filter = QueryFilter::new()
            .eq("requester_id", &actor.user_id)
            .eq_opt("status", status);
        self.requests.find_page(&filter, pagination).await
    }

    pub async fn accept_quote(
        &self,
        actor: &Actor,
        request_id: &MaterialRequestId,
        quote_id: &DistributorApplicationId,
    ) -> AppResult<MaterialRequest> {
        let mut request = self.load(request_id).await?;
        request.ensure_owner(&actor.user_id)?;
        request.ensure_open()?;

        let mut chosen = self.load_quote(request_id, quote_id).await?;
        if !chosen.is_pending() {
            return Err(AppError::failed_precondition(format!(
                "Quote is already {}",
                chosen.status()
            )));
        }

        let expected = request.version();
        request.assign(quote_id.clone(), chosen.distributor_id().clone(), &actor.user_id)?;
        self.requests.update(&request, expected).await?;

        let version = chosen.version();
        chosen.approve(&actor.user_id)?;
        self.applications.update(&chosen, version).await?;
        metrics::record_application(KIND, "approved");

        let mut rejected = Vec::new();
        for mut other in self.pending_quotes(request_id).await? {
            let version = other.version();
            other.reject(&actor.user_id)?;
            self.applications.update(&other, version).await?;
            metrics::record_application(KIND, "rejected");
            rejected.push(other);
        }

        info!(
            request_id = %request_id,
            quote_id = %quote_id,
            distributor_id = %chosen.distributor_id(),
            total = chosen.total().amount,
            rejected = rejected.len(),
            "Distributor quote accepted"
        );

        self.publish(
            actor,
            MarketplaceEvent::DistributorQuoteAccepted {
                request_id: request_id.clone(),
                application_id: quote_id.clone(),
                distributor_id: chosen.distributor_id().clone(),
                title: request.title().to_string(),
            },
        )
        .await;
        for other in rejected {
            self.publish(
                actor,
                MarketplaceEvent::DistributorQuoteRejected {
                    request_id: request_id.clone(),
                    application_id: other.id().clone(),
                    distributor_id: other.distributor_id().clone(),
                    title: request.title().to_string(),
                },
            )
            .await;
        }
        Ok(request)
    }

    pub async fn reject_quote(
        &self,
        actor: &Actor,
        request_id: &MaterialRequestId,
        quote_id: &DistributorApplicationId,
    ) -> AppResult<DistributorApplication> {
        let request = self.load(request_id).await?;
        request.ensure_owner(&actor.user_id)?;

        let mut quote = self.load_quote(request_id, quote_id).await?;
        let expected = quote.version();
        quote.reject(&actor.user_id)?;
        self.applications.update(&quote, expected).await?;
        metrics::record_application(KIND, "rejected");

        info!(request_id = %request_id, quote_id = %quote_id, "Distributor quote rejected");
        self.publish(
            actor,
            MarketplaceEvent::DistributorQuoteRejected {
                request_id: request_id.clone(),
                application_id: quote_id.clone(),
                distributor_id: quote.distributor_id().clone(),
                title: request.title().to_string(),
            },
        )
        .await;
        Ok(quote)
    }

    // ========== 供应商操作 ==========

    pub async fn browse_open(
        &self,
        query: BrowseRequestsQuery,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<MaterialRequest>> {
        let filter = QueryFilter::new()
            .eq("status", RequestStatus::Open)
            .search(&["title", "delivery_address"], query.keyword.as_deref());
        self.requests.find_page(&filter, pagination).await
    }

    pub async fn submit_quote(
        &self,
        actor: &Actor,
        request_id: &MaterialRequestId,
        cmd: SubmitQuoteCommand,
    ) -> AppResult<DistributorApplication> {
        require_role!(actor, Role::Distributor);
        cmd.validate()?;

        let request = self.load(request_id).await?;
        request.ensure_open()?;

        let existing = QueryFilter::new()
            .eq("material_request_id", request_id)
            .eq("distributor_id", &actor.user_id);
        if self.applications.count(&existing).await? > 0 {
            return Err(AppError::conflict("You have already quoted this request"));
        }

        let quote = DistributorApplication::new(
            &request,
            actor.user_id.clone(),
            cmd.message.trim(),
            cmd.quotes,
        )?;
        self.applications.insert(&quote).await?;

        // 报价期间清单被替换或需求已选定时，撤回这份报价
        let current = self.load(request_id).await?;
        if current.items() != request.items() || !current.is_open() {
            self.applications.delete(quote.id()).await?;
            return Err(AppError::conflict(
                "Material request changed while quoting, please quote again",
            ));
        }
        metrics::record_application(KIND, "submitted");

        info!(
            request_id = %request_id,
            quote_id = %quote.id(),
            distributor_id = %actor.user_id,
            total = quote.total().amount,
            "Distributor quoted"
        );
        self.publish(
            actor,
            MarketplaceEvent::DistributorQuoted {
                request_id: request_id.clone(),
                application_id: quote.id().clone(),
                requester_id: request.requester_id().clone(),
                distributor_id: actor.user_id.clone(),
                title: request.title().to_string(),
                total: quote.total().clone(),
            },
        )
        .await;
        Ok(quote)
    }

    pub async fn withdraw_quote(&self, actor: &Actor, quote_id: &DistributorApplicationId) -> AppResult<()> {
        let quote = self
            .applications
            .find_by_id(quote_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Quote {} not found", quote_id)))?;
        quote.ensure_applicant(&actor.user_id)?;
        if !quote.is_pending() {
            return Err(AppError::failed_precondition(format!(
                "Quote is already {}",
                quote.status()
            )));
        }

        self.applications.delete(quote_id).await?;
        metrics::record_application(KIND, "withdrawn");
        info!(quote_id = %quote_id, "Distributor quote withdrawn");
        Ok(())
    }

    pub async fn list_my_quotes(
        &self,
        actor: &Actor,
        status: Option<ApplicationStatus>,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<DistributorApplication>> {
        let filter = QueryFilter::new()
            .eq("distributor_id", &actor.user_id)
            .eq_opt("status", status);
        self.applications.find_page(&filter, pagination).await
    }

    // ========== 公共查询 ==========

    pub async fn get(&self, id: &MaterialRequestId) -> AppResult<MaterialRequest> {
        self.load(id).await
    }

    pub async fn list_quotes(
        &self,
        actor: &Actor,
        request_id: &MaterialRequestId,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<DistributorApplication>> {
        let request = self.load(request_id).await?;

        let mut filter = QueryFilter::new().eq("material_request_id", request_id);
        let sees_all = request.is_owned_by(&actor.user_id) || actor.is_admin();
        if !sees_all {
            if actor.role != Role::Distributor {
                return Err(AppError::forbidden(
                    "Only the requester can view quotes for this request",
                ));
            }
            filter = filter.eq("distributor_id", &actor.user_id);
        }
        self.applications.find_page(&filter, pagination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::InterleavedRepository;
    use crate::domain::value_objects::ItemQuote;
    use handyhub_adapter_memory::InMemoryRepository;
    use handyhub_common::UserId;
    use handyhub_domain_core::Money;

    fn service() -> MaterialRequestService {
        MaterialRequestService::new(
            Arc::new(InMemoryRepository::<MaterialRequest>::new()),
            Arc::new(InMemoryRepository::<DistributorApplication>::new()),
            Arc::new(EventBus::new()),
        )
    }

    fn create_cmd() -> CreateMaterialRequestCommand {
        CreateMaterialRequestCommand {
            title: "Bathroom tiles".to_string(),
            delivery_address: "District 7".to_string(),
            items: vec![
                MaterialItem::new("Ceramic tile 30x30", 40, "box"),
                MaterialItem::new("Tile adhesive", 5, "bag"),
            ],
        }
    }

    fn quote_cmd(tile: i64, glue: i64) -> SubmitQuoteCommand {
        SubmitQuoteCommand {
            message: "Delivery in 2 days".to_string(),
            quotes: vec![
                ItemQuote {
                    item_index: 1,
                    unit_price: Money::vnd(glue),
                },
                ItemQuote {
                    item_index: 0,
                    unit_price: Money::vnd(tile),
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_distributors_cannot_create_requests() {
        let svc = service();
        let distributor = Actor::new(UserId::new(), Role::Distributor);
        assert!(matches!(
            svc.create(&distributor, create_cmd()).await,
            Err(AppError::Forbidden(_))
        ));

        let contractor = Actor::new(UserId::new(), Role::Contractor);
        assert!(svc.create(&contractor, create_cmd()).await.is_ok());
    }

    #[tokio::test]
    async fn test_quote_total_and_accept() {
        let svc = service();
        let owner = Actor::new(UserId::new(), Role::Customer);
        let d1 = Actor::new(UserId::new(), Role::Distributor);
        let d2 = Actor::new(UserId::new(), Role::Distributor);
        let request = svc.create(&owner, create_cmd()).await.unwrap();

        let q1 = svc.submit_quote(&d1, request.id(), quote_cmd(150_000, 90_000)).await.unwrap();
        assert_eq!(q1.total(), &Money::vnd(40 * 150_000 + 5 * 90_000));
        assert_eq!(q1.quotes()[0].item_index, 0);

        let q2 = svc.submit_quote(&d2, request.id(), quote_cmd(140_000, 95_000)).await.unwrap();
        assert!(matches!(
            svc.submit_quote(&d2, request.id(), quote_cmd(1, 1)).await,
            Err(AppError::Conflict(_))
        ));

        let assigned = svc.accept_quote(&owner, request.id(), q2.id()).await.unwrap();
        assert_eq!(assigned.status(), RequestStatus::Assigned);
        assert_eq!(assigned.assigned_distributor_id(), Some(&d2.user_id));

        let d1_quotes = svc
            .list_my_quotes(&d1, None, &Pagination::default())
            .await
            .unwrap();
        assert_eq!(d1_quotes.items[0].status(), ApplicationStatus::Rejected);
    }

    #[tokio::test]
    async fn test_incomplete_quote_is_rejected() {
        let svc = service();
        let owner = Actor::new(UserId::new(), Role::Customer);
        let distributor = Actor::new(UserId::new(), Role::Distributor);
        let request = svc.create(&owner, create_cmd()).await.unwrap();

        let partial = SubmitQuoteCommand {
            message: "Only tiles".to_string(),
            quotes: vec![ItemQuote {
                item_index: 0,
                unit_price: Money::vnd(150_000),
            }],
        };
        let result = svc.submit_quote(&distributor, request.id(), partial).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    fn interleaved_service() -> (MaterialRequestService, Arc<InterleavedRepository<MaterialRequest>>) {
        let requests = Arc::new(InterleavedRepository::<MaterialRequest>::new());
        let svc = MaterialRequestService::new(
            requests.clone(),
            Arc::new(InMemoryRepository::<DistributorApplication>::new()),
            Arc::new(EventBus::new()),
        );
        (svc, requests)
    }

    #[tokio::test]
    async fn test_concurrent_quote_accepts_have_one_winner() {
        let (svc, requests) = interleaved_service();
        let owner = Actor::new(UserId::new(), Role::Contractor);
        let first_distributor = Actor::new(UserId::new(), Role::Distributor);
        let second_distributor = Actor::new(UserId::new(), Role::Distributor);
        let request = svc.create(&owner, create_cmd()).await.unwrap();
        let q1 = svc
            .submit_quote(&first_distributor, request.id(), quote_cmd(1_000, 2_000))
            .await
            .unwrap();
        let q2 = svc
            .submit_quote(&second_distributor, request.id(), quote_cmd(900, 2_100))
            .await
            .unwrap();

        requests.interleave_next_loads();
        let (first, second) = tokio::join!(
            svc.accept_quote(&owner, request.id(), q1.id()),
            svc.accept_quote(&owner, request.id(), q2.id()),
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| matches!(r, Err(AppError::Conflict(_))))
                .count(),
            1
        );

        let quotes = svc
            .list_quotes(&owner, request.id(), &Pagination::default())
            .await
            .unwrap();
        let approved = quotes
            .items
            .iter()
            .filter(|q| q.status() == ApplicationStatus::Approved)
            .count();
        assert_eq!(approved, 1);
    }

    #[tokio::test]
    async fn test_quote_against_replaced_items_is_withdrawn() {
        let (svc, requests) = interleaved_service();
        let owner = Actor::new(UserId::new(), Role::Customer);
        let distributor = Actor::new(UserId::new(), Role::Distributor);
        let request = svc.create(&owner, create_cmd()).await.unwrap();

        // 报价方读到旧清单后，发布者替换了清单
        requests.interleave_next_loads();
        let change_items = UpdateMaterialRequestCommand {
            items: Some(vec![MaterialItem::new("Grout", 2, "bag")]),
            ..Default::default()
        };
        let (quoted, updated) = tokio::join!(
            svc.submit_quote(&distributor, request.id(), quote_cmd(1_000, 2_000)),
            svc.update(&owner, request.id(), change_items),
        );

        assert_eq!(updated.unwrap().items().len(), 1);
        assert!(matches!(quoted, Err(AppError::Conflict(_))));
        let quotes = svc
            .list_quotes(&owner, request.id(), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(quotes.total, 0);
    }

    #[tokio::test]
    async fn test_items_locked_after_quotes() {
        let svc = service();
        let owner = Actor::new(UserId::new(), Role::Customer);
        let distributor = Actor::new(UserId::new(), Role::Distributor);
        let request = svc.create(&owner, create_cmd()).await.unwrap();
        svc.submit_quote(&distributor, request.id(), quote_cmd(1_000, 2_000))
            .await
            .unwrap();

        let change_items = UpdateMaterialRequestCommand {
            items: Some(vec![MaterialItem::new("Grout", 2, "bag")]),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(&owner, request.id(), change_items).await,
            Err(AppError::FailedPrecondition(_))
        ));

        let rename = UpdateMaterialRequestCommand {
            title: Some("Tiles for bathroom".to_string()),
            ..Default::default()
        };
        let updated = svc.update(&owner, request.id(), rename).await.unwrap();
        assert_eq!(updated.title(), "Tiles for bathroom");
    }
}
