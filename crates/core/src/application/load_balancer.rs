//! Queue Load Balancer - picks the least loaded queue of a company
//!
//! Algorithm:
//! 1. List the company's queues ascending by id
//! 2. Count open/pending tickets per queue (one query per queue, same tenant)
//! 3. Sort by (count, queue id) and take the first
//!
//! The balancer never writes. Two concurrent callers can read the same
//! snapshot and both assign to the same queue; the rebalancer evens that out.

use crate::domain::{ensure_id, CompanyId, QueueId, QueueLoad, QueueLoadSnapshot, ACTIVE_STATUSES};
use crate::error::{AppError, Result};
use crate::port::{QueueRepository, TicketRepository, TimeProvider};
use std::sync::Arc;
use tracing::{debug, info};

pub struct QueueLoadBalancer {
    queue_repo: Arc<dyn QueueRepository>,
    ticket_repo: Arc<dyn TicketRepository>,
    time_provider: Arc<dyn TimeProvider>,
}

impl QueueLoadBalancer {
    pub fn new(
        queue_repo: Arc<dyn QueueRepository>,
        ticket_repo: Arc<dyn TicketRepository>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            queue_repo,
            ticket_repo,
            time_provider,
        }
    }

    /// Take a load snapshot of every queue of the company
    ///
    /// An empty snapshot means the company has no queues. Any store failure
    /// is returned as `FetchFailure`, never as an empty snapshot.
    pub async fn load_snapshot(&self, company_id: CompanyId) -> Result<QueueLoadSnapshot> {
        ensure_id("company_id", company_id)?;

        let queues = self
            .queue_repo
            .list_queues(company_id)
            .await
            .map_err(into_fetch_failure)?;

        let mut loads = Vec::with_capacity(queues.len());
        for queue in queues {
            if queue.company_id != company_id {
                // Store returned a foreign queue; counting it would mix tenants
                return Err(AppError::FetchFailure(format!(
                    "queue {} belongs to company {}, not {}",
                    queue.id, queue.company_id, company_id
                )));
            }

            let active_tickets = self
                .ticket_repo
                .count_active_tickets(queue.id, company_id, &ACTIVE_STATUSES)
                .await
                .map_err(into_fetch_failure)?;

            loads.push(QueueLoad {
                queue_id: queue.id,
                name: queue.name,
                active_tickets,
            });
        }

        let snapshot = QueueLoadSnapshot::new(company_id, self.time_provider.now_millis(), loads);
        debug!(
            company_id,
            queues = snapshot.loads().len(),
            spread = snapshot.spread(),
            "Queue load snapshot taken"
        );
        Ok(snapshot)
    }

    /// Select the least loaded queue; ties go to the lowest queue id
    ///
    /// Returns `NoQueuesAvailable` when the company has no queues: the caller
    /// should leave the ticket unassigned instead of retrying.
    pub async fn select_queue(&self, company_id: CompanyId) -> Result<QueueId> {
        let snapshot = self.load_snapshot(company_id).await?;

        let chosen = snapshot
            .least_loaded()
            .ok_or(AppError::NoQueuesAvailable { company_id })?;

        info!(
            company_id,
            queue_id = chosen.queue_id,
            queue_name = %chosen.name,
            active_tickets = chosen.active_tickets,
            "Queue selected"
        );
        Ok(chosen.queue_id)
    }
}

// Reads only: a store error here is always a fetch failure
fn into_fetch_failure(err: AppError) -> AppError {
    match err {
        AppError::Store(msg) | AppError::Internal(msg) => AppError::FetchFailure(msg),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Queue, Ticket, TicketStatus};
    use crate::port::queue_repository::mocks::InMemoryQueueRepository;
    use crate::port::ticket_repository::mocks::InMemoryTicketRepository;
    use crate::port::time_provider::mocks::ManualClock;

    struct Fixture {
        queues: Arc<InMemoryQueueRepository>,
        tickets: Arc<InMemoryTicketRepository>,
        balancer: QueueLoadBalancer,
    }

    fn fixture(loads: &[(QueueId, usize)]) -> Fixture {
        let queues = Arc::new(InMemoryQueueRepository::new());
        let tickets = Arc::new(InMemoryTicketRepository::new());
        for &(id, count) in loads {
            queues.add(Queue::new(id, format!("queue-{}", id), 1));
            tickets.seed_active(id, 1, count);
        }
        let balancer = QueueLoadBalancer::new(
            queues.clone(),
            tickets.clone(),
            Arc::new(ManualClock::new(1_000)),
        );
        Fixture {
            queues,
            tickets,
            balancer,
        }
    }

    #[tokio::test]
    async fn test_lowest_count_wins() {
        let f = fixture(&[(5, 3), (2, 3), (9, 1)]);
        assert_eq!(f.balancer.select_queue(1).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_tie_goes_to_lowest_id() {
        let f = fixture(&[(5, 2), (2, 2)]);
        assert_eq!(f.balancer.select_queue(1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_all_equal_returns_lowest_id() {
        let f = fixture(&[(8, 0), (3, 0), (4, 0)]);
        assert_eq!(f.balancer.select_queue(1).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_selection_is_deterministic() {
        let f = fixture(&[(5, 4), (7, 1), (6, 1)]);
        for _ in 0..5 {
            assert_eq!(f.balancer.select_queue(1).await.unwrap(), 6);
        }
    }

    #[tokio::test]
    async fn test_no_queues_is_not_a_fetch_failure() {
        let f = fixture(&[]);
        let err = f.balancer.select_queue(1).await.unwrap_err();
        assert!(matches!(err, AppError::NoQueuesAvailable { company_id: 1 }));
    }

    #[tokio::test]
    async fn test_fetch_failures_are_distinct() {
        let f = fixture(&[(1, 0)]);

        f.queues.set_failing(true);
        let err = f.balancer.select_queue(1).await.unwrap_err();
        assert!(matches!(err, AppError::FetchFailure(_)));
        assert!(err.is_retryable());

        f.queues.set_failing(false);
        f.tickets.set_failing_reads(true);
        let err = f.balancer.select_queue(1).await.unwrap_err();
        assert!(matches!(err, AppError::FetchFailure(_)));
    }

    #[tokio::test]
    async fn test_closed_and_foreign_tenant_tickets_do_not_count() {
        let f = fixture(&[(1, 1), (2, 0)]);
        // Queue 2 gets closed tickets and a ticket counted under another tenant
        f.tickets
            .put(Ticket::new(500, TicketStatus::Closed, 1, 1, 1).in_queue(2));
        f.tickets
            .put(Ticket::new(501, TicketStatus::Closed, 2, 1, 1).in_queue(2));
        f.tickets
            .put(Ticket::new(502, TicketStatus::Open, 3, 1, 99).in_queue(2));

        let snapshot = f.balancer.load_snapshot(1).await.unwrap();
        let q2 = snapshot.loads().iter().find(|l| l.queue_id == 2).unwrap();
        assert_eq!(q2.active_tickets, 0);
        assert_eq!(f.balancer.select_queue(1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_other_tenants_queues_are_ignored() {
        let f = fixture(&[(4, 5)]);
        f.queues.add(Queue::new(1, "other-tenant", 2));
        assert_eq!(f.balancer.select_queue(1).await.unwrap(), 4);
        assert_eq!(f.balancer.select_queue(2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_company_rejected() {
        let f = fixture(&[(1, 0)]);
        let err = f.balancer.select_queue(0).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }
}
