// Ticket Routing Service - caller flow around guard, balancer and cache

use crate::application::duplicate_guard::DuplicateTicketGuard;
use crate::application::load_balancer::QueueLoadBalancer;
use crate::application::transfer_protection::TransferProtectionCache;
use crate::domain::{
    ensure_id, ChannelId, CompanyId, ContactId, DomainError, QueueId, TicketId, UserId,
};
use crate::error::{AppError, Result};
use crate::port::{QueueRepository, TicketRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Why a ticket was left without a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    /// Company has no queues configured
    NoQueuesAvailable,
    /// Queue or ticket store could not be read; a later pass may assign it
    FetchFailure(String),
}

/// Outcome of routing a ticket
///
/// Selection problems never block ticket creation: an unassigned ticket is a
/// valid state that a later pass or an agent fixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RoutingDecision {
    Assigned { queue_id: QueueId },
    Unassigned { reason: UnassignedReason },
}

impl RoutingDecision {
    pub fn queue_id(&self) -> Option<QueueId> {
        match self {
            RoutingDecision::Assigned { queue_id } => Some(*queue_id),
            RoutingDecision::Unassigned { .. } => None,
        }
    }
}

/// Result of a manual transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub ticket_id: TicketId,
    pub from_queue_id: Option<QueueId>,
    pub to_queue_id: QueueId,
    pub protected_for_secs: u64,
}

pub struct TicketRoutingService {
    guard: DuplicateTicketGuard,
    balancer: Arc<QueueLoadBalancer>,
    protection: Arc<TransferProtectionCache>,
    queue_repo: Arc<dyn QueueRepository>,
    ticket_repo: Arc<dyn TicketRepository>,
}

impl TicketRoutingService {
    pub fn new(
        balancer: Arc<QueueLoadBalancer>,
        protection: Arc<TransferProtectionCache>,
        queue_repo: Arc<dyn QueueRepository>,
        ticket_repo: Arc<dyn TicketRepository>,
    ) -> Self {
        Self {
            guard: DuplicateTicketGuard::new(ticket_repo.clone()),
            balancer,
            protection,
            queue_repo,
            ticket_repo,
        }
    }

    pub fn guard(&self) -> &DuplicateTicketGuard {
        &self.guard
    }

    /// Decide where a new or reopened conversation should go
    ///
    /// A duplicate open ticket is an error and must block creation. Queue
    /// selection problems only yield `Unassigned`. Nothing is written.
    pub async fn route_incoming(
        &self,
        contact_id: ContactId,
        channel_id: ChannelId,
        company_id: CompanyId,
    ) -> Result<RoutingDecision> {
        self.guard
            .check_no_open_ticket(contact_id, channel_id, company_id)
            .await?;

        self.decide(company_id).await
    }

    /// Select a queue for an existing ticket and persist the assignment
    pub async fn assign_ticket(&self, ticket_id: TicketId) -> Result<RoutingDecision> {
        ensure_id("ticket_id", ticket_id)?;

        let ticket = self
            .ticket_repo
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket {} not found", ticket_id)))?;

        let decision = self.decide(ticket.company_id).await?;
        if let RoutingDecision::Assigned { queue_id } = decision {
            self.ticket_repo.assign_queue(ticket_id, queue_id).await?;
            info!(
                ticket_id,
                queue_id,
                company_id = ticket.company_id,
                "Ticket assigned to queue"
            );
        }
        Ok(decision)
    }

    /// Agent moves a ticket by hand: persist, then shield it from the rebalancer
    pub async fn transfer_ticket(
        &self,
        ticket_id: TicketId,
        user_id: UserId,
        target_queue_id: QueueId,
    ) -> Result<TransferReceipt> {
        ensure_id("ticket_id", ticket_id)?;
        ensure_id("user_id", user_id)?;
        ensure_id("queue_id", target_queue_id)?;

        let ticket = self
            .ticket_repo
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket {} not found", ticket_id)))?;

        let queue = self
            .queue_repo
            .find_queue(target_queue_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Queue {} not found", target_queue_id)))?;

        if queue.company_id != ticket.company_id {
            return Err(DomainError::QueueOutsideTenant {
                queue_id: queue.id,
                company_id: ticket.company_id,
            }
            .into());
        }

        self.ticket_repo
            .assign_queue(ticket_id, target_queue_id)
            .await?;
        // Only protect what was actually persisted
        self.protection
            .mark_manual_transfer(ticket_id, user_id, target_queue_id);

        info!(
            ticket_id,
            user_id,
            from_queue_id = ?ticket.queue_id,
            to_queue_id = target_queue_id,
            "Ticket transferred manually"
        );

        Ok(TransferReceipt {
            ticket_id,
            from_queue_id: ticket.queue_id,
            to_queue_id: target_queue_id,
            protected_for_secs: self.protection.window().as_secs(),
        })
    }

    async fn decide(&self, company_id: CompanyId) -> Result<RoutingDecision> {
        match self.balancer.select_queue(company_id).await {
            Ok(queue_id) => Ok(RoutingDecision::Assigned { queue_id }),
            Err(AppError::NoQueuesAvailable { .. }) => {
                warn!(company_id, "No queues configured; ticket left unassigned");
                Ok(RoutingDecision::Unassigned {
                    reason: UnassignedReason::NoQueuesAvailable,
                })
            }
            Err(AppError::FetchFailure(msg)) => {
                warn!(company_id, error = %msg, "Queue selection failed; ticket left unassigned");
                Ok(RoutingDecision::Unassigned {
                    reason: UnassignedReason::FetchFailure(msg),
                })
            }
            Err(other) => Err(other),
        }
    }
}
