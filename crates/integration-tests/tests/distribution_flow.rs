//! Distribution flow against SQLite
//!
//! Duplicate guard, least-loaded selection and routing over the real adapters.

use std::sync::Arc;

use ticketflow_core::application::{
    ProtectionConfig, QueueLoadBalancer, RoutingDecision, TicketRoutingService,
    TransferProtectionCache, UnassignedReason,
};
use ticketflow_core::domain::{Ticket, TicketStatus};
use ticketflow_core::error::AppError;
use ticketflow_core::port::time_provider::SystemTimeProvider;
use ticketflow_core::port::TicketRepository;
use ticketflow_infra_sqlite::{
    create_pool, run_migrations, SqliteQueueRepository, SqliteTicketRepository,
};
use tokio_test::{assert_err, assert_ok};

struct Harness {
    queues: Arc<SqliteQueueRepository>,
    tickets: Arc<SqliteTicketRepository>,
    balancer: Arc<QueueLoadBalancer>,
    routing: TicketRoutingService,
}

async fn setup() -> Harness {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let clock = Arc::new(SystemTimeProvider);
    let queues = Arc::new(SqliteQueueRepository::new(pool.clone()));
    let tickets = Arc::new(SqliteTicketRepository::new(pool, clock.clone()));
    let protection = Arc::new(TransferProtectionCache::new(
        ProtectionConfig::default(),
        clock.clone(),
    ));
    let balancer = Arc::new(QueueLoadBalancer::new(
        queues.clone(),
        tickets.clone(),
        clock,
    ));
    let routing = TicketRoutingService::new(
        balancer.clone(),
        protection,
        queues.clone(),
        tickets.clone(),
    );

    Harness {
        queues,
        tickets,
        balancer,
        routing,
    }
}

#[tokio::test]
async fn test_least_loaded_queue_selected() {
    let h = setup().await;
    let q5 = h.queues.create_queue("billing", 1).await.unwrap();
    let q2 = h.queues.create_queue("sales", 1).await.unwrap();
    let q9 = h.queues.create_queue("support", 1).await.unwrap();

    let mut next_id = 1;
    for (queue_id, count) in [(q5.id, 3), (q2.id, 3), (q9.id, 1)] {
        for _ in 0..count {
            h.tickets
                .insert(&Ticket::new(next_id, TicketStatus::Open, next_id, 1, 1).in_queue(queue_id))
                .await
                .unwrap();
            next_id += 1;
        }
    }

    assert_eq!(h.balancer.select_queue(1).await.unwrap(), q9.id);
}

#[tokio::test]
async fn test_ties_resolve_to_lowest_queue_id() {
    let h = setup().await;
    let first = h.queues.create_queue("a", 1).await.unwrap();
    let second = h.queues.create_queue("b", 1).await.unwrap();
    h.tickets
        .insert(&Ticket::new(1, TicketStatus::Open, 1, 1, 1).in_queue(first.id))
        .await
        .unwrap();
    h.tickets
        .insert(&Ticket::new(2, TicketStatus::Pending, 2, 1, 1).in_queue(second.id))
        .await
        .unwrap();

    for _ in 0..5 {
        assert_eq!(h.balancer.select_queue(1).await.unwrap(), first.id);
    }
}

#[tokio::test]
async fn test_closed_and_foreign_tickets_do_not_count() {
    let h = setup().await;
    let busy = h.queues.create_queue("busy", 1).await.unwrap();
    let quiet = h.queues.create_queue("quiet", 1).await.unwrap();

    // Closed tickets and another tenant's rows on `quiet` must be ignored
    h.tickets
        .insert(&Ticket::new(1, TicketStatus::Open, 1, 1, 1).in_queue(busy.id))
        .await
        .unwrap();
    for id in 2..6 {
        h.tickets
            .insert(&Ticket::new(id, TicketStatus::Closed, id, 1, 1).in_queue(quiet.id))
            .await
            .unwrap();
    }
    h.tickets
        .insert(&Ticket::new(6, TicketStatus::Open, 6, 1, 2).in_queue(quiet.id))
        .await
        .unwrap();

    let snapshot = h.balancer.load_snapshot(1).await.unwrap();
    let counts: Vec<(i64, i64)> = snapshot
        .loads()
        .iter()
        .map(|l| (l.queue_id, l.active_tickets))
        .collect();
    assert_eq!(counts, vec![(quiet.id, 0), (busy.id, 1)]);
}

#[tokio::test]
async fn test_duplicate_open_ticket_blocks_route() {
    let h = setup().await;
    h.queues.create_queue("sales", 1).await.unwrap();
    h.tickets
        .insert(&Ticket::new(42, TicketStatus::Pending, 7, 3, 1))
        .await
        .unwrap();

    let err = assert_err!(h.routing.route_incoming(7, 3, 1).await);
    assert!(matches!(err, AppError::DuplicateOpenTicket { ticket_id: 42 }));

    // Same contact on another channel or tenant is free
    assert_ok!(h.routing.route_incoming(7, 4, 1).await);
    assert_ok!(h.routing.guard().check_no_open_ticket(7, 3, 2).await);
}

#[tokio::test]
async fn test_closed_ticket_allows_new_one() {
    let h = setup().await;
    h.tickets
        .insert(&Ticket::new(1, TicketStatus::Closed, 7, 3, 1))
        .await
        .unwrap();

    assert_ok!(h.routing.guard().check_no_open_ticket(7, 3, 1).await);
}

#[tokio::test]
async fn test_company_without_queues_stays_unassigned() {
    let h = setup().await;
    h.queues.create_queue("other-tenant", 2).await.unwrap();

    let decision = assert_ok!(h.routing.route_incoming(7, 3, 1).await);
    assert_eq!(
        decision,
        RoutingDecision::Unassigned {
            reason: UnassignedReason::NoQueuesAvailable
        }
    );

    let err = assert_err!(h.balancer.select_queue(1).await);
    assert!(matches!(err, AppError::NoQueuesAvailable { company_id: 1 }));
}

#[tokio::test]
async fn test_assign_ticket_persists_choice() {
    let h = setup().await;
    let sales = h.queues.create_queue("sales", 1).await.unwrap();
    let support = h.queues.create_queue("support", 1).await.unwrap();
    h.tickets
        .insert(&Ticket::new(1, TicketStatus::Open, 1, 1, 1).in_queue(sales.id))
        .await
        .unwrap();
    h.tickets
        .insert(&Ticket::new(2, TicketStatus::Open, 2, 1, 1))
        .await
        .unwrap();

    let decision = assert_ok!(h.routing.assign_ticket(2).await);
    assert_eq!(decision.queue_id(), Some(support.id));

    let stored = h.tickets.find_by_id(2).await.unwrap().unwrap();
    assert_eq!(stored.queue_id, Some(support.id));

    // Next one goes back to the lowest id now that both hold one
    h.tickets
        .insert(&Ticket::new(3, TicketStatus::Open, 3, 1, 1))
        .await
        .unwrap();
    let decision = assert_ok!(h.routing.assign_ticket(3).await);
    assert_eq!(decision.queue_id(), Some(sales.id));
}

#[tokio::test]
async fn test_assign_unknown_ticket_not_found() {
    let h = setup().await;
    h.queues.create_queue("sales", 1).await.unwrap();

    let err = assert_err!(h.routing.assign_ticket(999).await);
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_invalid_identifiers_rejected() {
    let h = setup().await;

    let err = assert_err!(h.routing.route_incoming(0, 3, 1).await);
    assert!(matches!(err, AppError::InvalidArgument(_)));
    let err = assert_err!(h.balancer.select_queue(-1).await);
    assert!(matches!(err, AppError::InvalidArgument(_)));
}
