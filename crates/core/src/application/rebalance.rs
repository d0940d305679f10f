//! Rebalancer - evens out queue load inside a company
//!
//! Repeatedly moves one active ticket from the most loaded queue to the least
//! loaded one until the spread is acceptable. Tickets an agent placed by hand
//! are skipped while their transfer protection lasts.
//!
//! No lock is taken against concurrent ticket creation; a pass works on its
//! own snapshot and the next pass corrects whatever it missed.

use crate::application::constants::{
    DEFAULT_REBALANCE_INTERVAL, DEFAULT_REBALANCE_MAX_MOVES, DEFAULT_REBALANCE_MAX_SPREAD,
};
use crate::application::load_balancer::QueueLoadBalancer;
use crate::application::shutdown::ShutdownToken;
use crate::application::transfer_protection::TransferProtectionCache;
use crate::domain::{CompanyId, QueueId, Ticket, TicketId, ACTIVE_STATUSES};
use crate::error::Result;
use crate::port::{QueueRepository, TicketRepository};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Rebalancer configuration
#[derive(Debug, Clone)]
pub struct RebalanceConfig {
    /// Stop once most and least loaded queue differ by at most this much
    /// (values below 1 act as 1)
    pub max_spread: i64,
    /// Cap on moves per company and pass
    pub max_moves_per_pass: usize,
    /// Time between scheduled passes
    pub interval: Duration,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            max_spread: DEFAULT_REBALANCE_MAX_SPREAD,
            max_moves_per_pass: DEFAULT_REBALANCE_MAX_MOVES,
            interval: DEFAULT_REBALANCE_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMove {
    pub ticket_id: TicketId,
    pub from_queue_id: QueueId,
    pub to_queue_id: QueueId,
}

/// What a pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceReport {
    pub companies: usize,
    pub failed_companies: usize,
    pub moved: usize,
    pub skipped_protected: usize,
    pub moves: Vec<TicketMove>,
}

impl RebalanceReport {
    fn merge(&mut self, other: RebalanceReport) {
        self.companies += other.companies;
        self.failed_companies += other.failed_companies;
        self.moved += other.moved;
        self.skipped_protected += other.skipped_protected;
        self.moves.extend(other.moves);
    }
}

pub struct RebalanceService {
    balancer: Arc<QueueLoadBalancer>,
    protection: Arc<TransferProtectionCache>,
    queue_repo: Arc<dyn QueueRepository>,
    ticket_repo: Arc<dyn TicketRepository>,
    config: RebalanceConfig,
}

impl RebalanceService {
    pub fn new(
        balancer: Arc<QueueLoadBalancer>,
        protection: Arc<TransferProtectionCache>,
        queue_repo: Arc<dyn QueueRepository>,
        ticket_repo: Arc<dyn TicketRepository>,
        config: RebalanceConfig,
    ) -> Self {
        Self {
            balancer,
            protection,
            queue_repo,
            ticket_repo,
            config,
        }
    }

    pub fn config(&self) -> &RebalanceConfig {
        &self.config
    }

    /// Rebalance one company
    pub async fn rebalance_company(&self, company_id: CompanyId) -> Result<RebalanceReport> {
        let mut snapshot = self.balancer.load_snapshot(company_id).await?;
        let mut report = RebalanceReport {
            companies: 1,
            ..Default::default()
        };

        // Candidates per source queue, fetched once per pass
        let mut candidates: HashMap<QueueId, VecDeque<Ticket>> = HashMap::new();

        // A move only helps while the gap is at least 2; below that it just flips
        let max_spread = self.config.max_spread.max(1);

        while report.moved < self.config.max_moves_per_pass && snapshot.spread() > max_spread {
            let (Some(source), Some(target)) = (snapshot.most_loaded(), snapshot.least_loaded())
            else {
                break;
            };
            let (from, to) = (source.queue_id, target.queue_id);
            if from == to {
                break;
            }

            if !candidates.contains_key(&from) {
                let tickets = self
                    .ticket_repo
                    .list_active_tickets(from, company_id, &ACTIVE_STATUSES)
                    .await?;
                candidates.insert(from, tickets.into());
            }

            let Some(ticket) = candidates.get_mut(&from).and_then(VecDeque::pop_front) else {
                debug!(
                    company_id,
                    queue_id = from,
                    "Most loaded queue has no movable tickets left"
                );
                break;
            };

            if self.protection.is_protected(ticket.id) {
                debug!(
                    ticket_id = ticket.id,
                    queue_id = from,
                    age_minutes = ?self.protection.transfer_age_minutes(ticket.id),
                    "Skipping manually transferred ticket"
                );
                report.skipped_protected += 1;
                continue;
            }

            self.ticket_repo.assign_queue(ticket.id, to).await?;
            snapshot.record_move(from, to);
            report.moved += 1;
            report.moves.push(TicketMove {
                ticket_id: ticket.id,
                from_queue_id: from,
                to_queue_id: to,
            });
            debug!(
                ticket_id = ticket.id,
                from_queue_id = from,
                to_queue_id = to,
                "Ticket rebalanced"
            );
        }

        if report.moved > 0 || report.skipped_protected > 0 {
            info!(
                company_id,
                moved = report.moved,
                skipped_protected = report.skipped_protected,
                spread = snapshot.spread(),
                "Company rebalanced"
            );
        }
        Ok(report)
    }

    /// Rebalance every company that has queues
    ///
    /// A failing company is logged and counted; the others still run.
    pub async fn rebalance_all(&self) -> Result<RebalanceReport> {
        let company_ids = self.queue_repo.list_company_ids().await?;
        let mut report = RebalanceReport::default();

        for company_id in company_ids {
            match self.rebalance_company(company_id).await {
                Ok(company_report) => report.merge(company_report),
                Err(e) => {
                    error!(company_id, error = %e, "Rebalance failed for company");
                    report.companies += 1;
                    report.failed_companies += 1;
                }
            }
        }
        Ok(report)
    }
}

/// Rebalance scheduler
///
/// Runs `rebalance_all` every configured interval until shutdown
pub struct RebalanceScheduler {
    service: Arc<RebalanceService>,
}

impl RebalanceScheduler {
    pub fn new(service: Arc<RebalanceService>) -> Self {
        Self { service }
    }

    /// Run rebalance loop (background task)
    ///
    /// Should be spawned in tokio::spawn
    pub async fn run(self, mut shutdown: ShutdownToken) {
        let every = self.service.config().interval;
        info!(interval_secs = every.as_secs(), "Rebalance scheduler started");

        let mut tick = interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match self.service.rebalance_all().await {
                        Ok(report) => {
                            info!(
                                companies = report.companies,
                                failed = report.failed_companies,
                                moved = report.moved,
                                skipped_protected = report.skipped_protected,
                                "Scheduled rebalance completed"
                            );
                        }
                        Err(e) => {
                            error!(error = ?e, "Scheduled rebalance failed");
                        }
                    }
                }
                _ = shutdown.wait() => break,
            }
        }

        info!("Rebalance scheduler stopped");
    }
}
