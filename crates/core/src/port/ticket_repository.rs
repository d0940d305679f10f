// Ticket Repository Port (Interface)

use crate::domain::{ChannelId, CompanyId, ContactId, QueueId, Ticket, TicketId, TicketStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Ticket store as seen by the distribution core
///
/// Every query is scoped by company; counting a queue's tickets under a
/// different tenant than the queue's own is a data integrity bug upstream.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Insert a ticket (seeding / external creation flow)
    async fn insert(&self, ticket: &Ticket) -> Result<()>;

    /// Find ticket by ID
    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>>;

    /// Count tickets in a queue with one of the given statuses
    async fn count_active_tickets(
        &self,
        queue_id: QueueId,
        company_id: CompanyId,
        statuses: &[TicketStatus],
    ) -> Result<i64>;

    /// Find an open/pending ticket for the contact on the channel
    async fn find_open_ticket(
        &self,
        contact_id: ContactId,
        channel_id: ChannelId,
        company_id: CompanyId,
    ) -> Result<Option<Ticket>>;

    /// List tickets in a queue with one of the given statuses, ascending by id
    async fn list_active_tickets(
        &self,
        queue_id: QueueId,
        company_id: CompanyId,
        statuses: &[TicketStatus],
    ) -> Result<Vec<Ticket>>;

    /// Persist a queue assignment
    async fn assign_queue(&self, ticket_id: TicketId, queue_id: QueueId) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::ACTIVE_STATUSES;
    use crate::error::AppError;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use std::sync::Mutex;

    /// In-memory ticket store
    #[derive(Default)]
    pub struct InMemoryTicketRepository {
        tickets: Mutex<BTreeMap<TicketId, Ticket>>,
        next_id: AtomicI64,
        failing_reads: AtomicBool,
        failing_writes: AtomicBool,
    }

    impl InMemoryTicketRepository {
        pub fn new() -> Self {
            Self {
                next_id: AtomicI64::new(1),
                ..Default::default()
            }
        }

        pub fn put(&self, ticket: Ticket) {
            self.tickets.lock().unwrap().insert(ticket.id, ticket);
        }

        /// Seed `count` open tickets into a queue, returning their ids
        pub fn seed_active(
            &self,
            queue_id: QueueId,
            company_id: CompanyId,
            count: usize,
        ) -> Vec<TicketId> {
            (0..count)
                .map(|_| {
                    let id = 10_000 + self.next_id.fetch_add(1, Ordering::SeqCst);
                    self.put(
                        Ticket::new(id, TicketStatus::Open, id, 1, company_id).in_queue(queue_id),
                    );
                    id
                })
                .collect()
        }

        pub fn get(&self, id: TicketId) -> Option<Ticket> {
            self.tickets.lock().unwrap().get(&id).cloned()
        }

        pub fn set_failing_reads(&self, failing: bool) {
            self.failing_reads.store(failing, Ordering::SeqCst);
        }

        pub fn set_failing_writes(&self, failing: bool) {
            self.failing_writes.store(failing, Ordering::SeqCst);
        }

        fn check_read(&self) -> Result<()> {
            if self.failing_reads.load(Ordering::SeqCst) {
                return Err(AppError::FetchFailure("ticket store unavailable".to_string()));
            }
            Ok(())
        }

        fn check_write(&self) -> Result<()> {
            if self.failing_writes.load(Ordering::SeqCst) {
                return Err(AppError::Store("ticket store read-only".to_string()));
            }
            Ok(())
        }

        fn matching(
            &self,
            queue_id: QueueId,
            company_id: CompanyId,
            statuses: &[TicketStatus],
        ) -> Vec<Ticket> {
            self.tickets
                .lock()
                .unwrap()
                .values()
                .filter(|t| {
                    t.queue_id == Some(queue_id)
                        && t.company_id == company_id
                        && statuses.contains(&t.status)
                })
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl TicketRepository for InMemoryTicketRepository {
        async fn insert(&self, ticket: &Ticket) -> Result<()> {
            self.check_write()?;
            self.put(ticket.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>> {
            self.check_read()?;
            Ok(self.get(id))
        }

        async fn count_active_tickets(
            &self,
            queue_id: QueueId,
            company_id: CompanyId,
            statuses: &[TicketStatus],
        ) -> Result<i64> {
            self.check_read()?;
            Ok(self.matching(queue_id, company_id, statuses).len() as i64)
        }

        async fn find_open_ticket(
            &self,
            contact_id: ContactId,
            channel_id: ChannelId,
            company_id: CompanyId,
        ) -> Result<Option<Ticket>> {
            self.check_read()?;
            Ok(self
                .tickets
                .lock()
                .unwrap()
                .values()
                .find(|t| {
                    t.contact_id == contact_id
                        && t.channel_id == channel_id
                        && t.company_id == company_id
                        && ACTIVE_STATUSES.contains(&t.status)
                })
                .cloned())
        }

        async fn list_active_tickets(
            &self,
            queue_id: QueueId,
            company_id: CompanyId,
            statuses: &[TicketStatus],
        ) -> Result<Vec<Ticket>> {
            self.check_read()?;
            Ok(self.matching(queue_id, company_id, statuses))
        }

        async fn assign_queue(&self, ticket_id: TicketId, queue_id: QueueId) -> Result<()> {
            self.check_write()?;
            let mut tickets = self.tickets.lock().unwrap();
            match tickets.get_mut(&ticket_id) {
                Some(ticket) => {
                    ticket.queue_id = Some(queue_id);
                    Ok(())
                }
                None => Err(AppError::NotFound(format!("Ticket {} not found", ticket_id))),
            }
        }
    }
}
