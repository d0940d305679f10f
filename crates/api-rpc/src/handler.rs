//! RPC Method Handlers
//!
//! Thin adapters from JSON-RPC params to the core services.

use crate::error::to_rpc_error;
use crate::types::{
    AssignTicketRequest, CheckOpenTicketResponse, CompanyRequest, ContactChannelRequest,
    ProtectionStatsResponse, ProtectionStatusResponse, RebalanceRequest, SelectQueueResponse,
    SweepResponse, TicketRequest, TransferRequest,
};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use ticketflow_core::application::{
    QueueLoadBalancer, RebalanceReport, RebalanceService, RoutingDecision, TicketRoutingService,
    TransferProtectionCache, TransferReceipt,
};
use ticketflow_core::domain::{ensure_id, QueueLoadSnapshot, TicketId};
use ticketflow_core::error::AppError;

type RpcResult<T> = Result<T, ErrorObjectOwned>;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    routing: Arc<TicketRoutingService>,
    balancer: Arc<QueueLoadBalancer>,
    protection: Arc<TransferProtectionCache>,
    rebalance: Arc<RebalanceService>,
}

impl RpcHandler {
    pub fn new(
        routing: Arc<TicketRoutingService>,
        balancer: Arc<QueueLoadBalancer>,
        protection: Arc<TransferProtectionCache>,
        rebalance: Arc<RebalanceService>,
    ) -> Self {
        Self {
            routing,
            balancer,
            protection,
            rebalance,
        }
    }

    /// ticket.checkOpen.v1
    pub async fn check_open(
        &self,
        params: ContactChannelRequest,
    ) -> RpcResult<CheckOpenTicketResponse> {
        self.routing
            .guard()
            .check_no_open_ticket(params.contact_id, params.channel_id, params.company_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(CheckOpenTicketResponse {
            contact_id: params.contact_id,
            channel_id: params.channel_id,
            company_id: params.company_id,
            can_open: true,
        })
    }

    /// ticket.route.v1
    pub async fn route(&self, params: ContactChannelRequest) -> RpcResult<RoutingDecision> {
        self.routing
            .route_incoming(params.contact_id, params.channel_id, params.company_id)
            .await
            .map_err(to_rpc_error)
    }

    /// ticket.assign.v1
    pub async fn assign(&self, params: AssignTicketRequest) -> RpcResult<RoutingDecision> {
        self.routing
            .assign_ticket(params.ticket_id)
            .await
            .map_err(to_rpc_error)
    }

    /// ticket.transfer.v1
    pub async fn transfer(&self, params: TransferRequest) -> RpcResult<TransferReceipt> {
        self.routing
            .transfer_ticket(params.ticket_id, params.user_id, params.queue_id)
            .await
            .map_err(to_rpc_error)
    }

    /// queue.select.v1
    pub async fn select_queue(&self, params: CompanyRequest) -> RpcResult<SelectQueueResponse> {
        let queue_id = self
            .balancer
            .select_queue(params.company_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(SelectQueueResponse {
            company_id: params.company_id,
            queue_id,
        })
    }

    /// queue.loads.v1
    pub async fn queue_loads(&self, params: CompanyRequest) -> RpcResult<QueueLoadSnapshot> {
        self.balancer
            .load_snapshot(params.company_id)
            .await
            .map_err(to_rpc_error)
    }

    /// protection.mark.v1
    ///
    /// Records protection without moving the ticket, for flows that persist
    /// the transfer themselves.
    pub fn mark_protection(&self, params: TransferRequest) -> RpcResult<ProtectionStatusResponse> {
        validate(|| {
            ensure_id("ticket_id", params.ticket_id)?;
            ensure_id("user_id", params.user_id)?;
            ensure_id("queue_id", params.queue_id)?;
            Ok(())
        })?;

        self.protection
            .mark_manual_transfer(params.ticket_id, params.user_id, params.queue_id);
        Ok(self.status(params.ticket_id))
    }

    /// protection.check.v1
    pub fn check_protection(&self, params: TicketRequest) -> RpcResult<ProtectionStatusResponse> {
        validate(|| ensure_id("ticket_id", params.ticket_id).map(|_| ()))?;
        Ok(self.status(params.ticket_id))
    }

    /// protection.remove.v1
    pub fn remove_protection(&self, params: TicketRequest) -> RpcResult<ProtectionStatusResponse> {
        validate(|| ensure_id("ticket_id", params.ticket_id).map(|_| ()))?;
        self.protection.remove_protection(params.ticket_id);
        Ok(self.status(params.ticket_id))
    }

    /// protection.sweep.v1
    pub fn sweep(&self) -> SweepResponse {
        let removed = self.protection.sweep_expired();
        SweepResponse {
            removed,
            stats: self.protection.stats(),
        }
    }

    /// protection.stats.v1
    pub fn protection_stats(&self) -> ProtectionStatsResponse {
        let stats = self.protection.stats();
        ProtectionStatsResponse {
            total: stats.total,
            protected_count: stats.protected_count,
            window_secs: self.protection.window().as_secs(),
        }
    }

    /// admin.rebalance.v1
    pub async fn rebalance(&self, params: Option<RebalanceRequest>) -> RpcResult<RebalanceReport> {
        let result = match params.and_then(|p| p.company_id) {
            Some(company_id) => self.rebalance.rebalance_company(company_id).await,
            None => self.rebalance.rebalance_all().await,
        };
        result.map_err(to_rpc_error)
    }

    // is_protected runs first so an expired entry is evicted before it is read back
    fn status(&self, ticket_id: TicketId) -> ProtectionStatusResponse {
        let protected = self.protection.is_protected(ticket_id);
        ProtectionStatusResponse {
            ticket_id,
            protected,
            age_minutes: self.protection.transfer_age_minutes(ticket_id),
            entry: self.protection.entry(ticket_id),
        }
    }
}

fn validate(
    check: impl FnOnce() -> ticketflow_core::domain::error::Result<()>,
) -> RpcResult<()> {
    check().map_err(|e| to_rpc_error(AppError::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use ticketflow_core::application::{ProtectionConfig, RebalanceConfig};
    use ticketflow_core::domain::{Queue, Ticket, TicketStatus};
    use ticketflow_core::port::queue_repository::mocks::InMemoryQueueRepository;
    use ticketflow_core::port::ticket_repository::mocks::InMemoryTicketRepository;
    use ticketflow_core::port::time_provider::mocks::ManualClock;

    struct Fixture {
        tickets: Arc<InMemoryTicketRepository>,
        clock: Arc<ManualClock>,
        handler: RpcHandler,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(0));
        let queues = Arc::new(InMemoryQueueRepository::with_queues(vec![
            Queue::new(1, "sales", 1),
            Queue::new(2, "support", 1),
        ]));
        let tickets = Arc::new(InMemoryTicketRepository::new());
        let protection = Arc::new(TransferProtectionCache::new(
            ProtectionConfig::default(),
            clock.clone(),
        ));
        let balancer = Arc::new(QueueLoadBalancer::new(
            queues.clone(),
            tickets.clone(),
            clock.clone(),
        ));
        let routing = Arc::new(TicketRoutingService::new(
            balancer.clone(),
            protection.clone(),
            queues.clone(),
            tickets.clone(),
        ));
        let rebalance = Arc::new(RebalanceService::new(
            balancer.clone(),
            protection.clone(),
            queues,
            tickets.clone(),
            RebalanceConfig::default(),
        ));
        Fixture {
            tickets,
            clock,
            handler: RpcHandler::new(routing, balancer, protection, rebalance),
        }
    }

    #[tokio::test]
    async fn test_check_open_conflict_code() {
        let f = fixture();
        f.tickets.put(Ticket::new(42, TicketStatus::Open, 7, 3, 1));

        let err = f
            .handler
            .check_open(ContactChannelRequest {
                contact_id: 7,
                channel_id: 3,
                company_id: 1,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::CONFLICT);

        let ok = f
            .handler
            .check_open(ContactChannelRequest {
                contact_id: 7,
                channel_id: 3,
                company_id: 2,
            })
            .await
            .unwrap();
        assert!(ok.can_open);
    }

    #[tokio::test]
    async fn test_select_queue_and_no_queue_code() {
        let f = fixture();
        f.tickets.seed_active(1, 1, 1);

        let resp = f
            .handler
            .select_queue(CompanyRequest { company_id: 1 })
            .await
            .unwrap();
        assert_eq!(resp.queue_id, 2);

        let err = f
            .handler
            .select_queue(CompanyRequest { company_id: 9 })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::NO_QUEUES);
    }

    #[test]
    fn test_protection_lifecycle() {
        let f = fixture();
        let marked = f
            .handler
            .mark_protection(TransferRequest {
                ticket_id: 5,
                user_id: 9,
                queue_id: 2,
            })
            .unwrap();
        assert!(marked.protected);
        assert_eq!(marked.age_minutes, Some(0));
        assert_eq!(f.handler.protection_stats().total, 1);

        f.clock.set(11 * 60_000);
        let checked = f
            .handler
            .check_protection(TicketRequest { ticket_id: 5 })
            .unwrap();
        assert!(!checked.protected);
        assert_eq!(checked.age_minutes, None, "expired entry evicted on check");

        let removed = f
            .handler
            .remove_protection(TicketRequest { ticket_id: 5 })
            .unwrap();
        assert!(!removed.protected);
        assert_eq!(f.handler.sweep().removed, 0);
    }

    #[test]
    fn test_invalid_ids_rejected() {
        let f = fixture();
        let err = f
            .handler
            .mark_protection(TransferRequest {
                ticket_id: 0,
                user_id: 9,
                queue_id: 2,
            })
            .unwrap_err();
        assert_eq!(err.code(), code::INVALID_ARGUMENT);
        assert_eq!(f.handler.protection_stats().total, 0);
    }

    #[tokio::test]
    async fn test_rebalance_all_when_no_company() {
        let f = fixture();
        f.tickets.seed_active(1, 1, 4);

        let report = f.handler.rebalance(None).await.unwrap();
        assert_eq!(report.moved, 2);
    }
}
