// Duplicate open ticket guard

use crate::domain::{ensure_id, ChannelId, CompanyId, ContactId};
use crate::error::{AppError, Result};
use crate::port::TicketRepository;
use std::sync::Arc;
use tracing::{debug, info};

/// Refuses a second open/pending ticket for the same contact on the same
/// channel within a company.
///
/// Point-in-time check: two concurrent creations can both pass. The store's
/// own constraints (if any) are the last line of defence.
pub struct DuplicateTicketGuard {
    ticket_repo: Arc<dyn TicketRepository>,
}

impl DuplicateTicketGuard {
    pub fn new(ticket_repo: Arc<dyn TicketRepository>) -> Self {
        Self { ticket_repo }
    }

    /// Fails with `DuplicateOpenTicket` carrying the existing ticket id
    pub async fn check_no_open_ticket(
        &self,
        contact_id: ContactId,
        channel_id: ChannelId,
        company_id: CompanyId,
    ) -> Result<()> {
        ensure_id("contact_id", contact_id)?;
        ensure_id("channel_id", channel_id)?;
        ensure_id("company_id", company_id)?;

        match self
            .ticket_repo
            .find_open_ticket(contact_id, channel_id, company_id)
            .await?
        {
            Some(existing) => {
                info!(
                    ticket_id = existing.id,
                    contact_id,
                    channel_id,
                    company_id,
                    status = %existing.status,
                    "Rejected duplicate open ticket"
                );
                Err(AppError::DuplicateOpenTicket {
                    ticket_id: existing.id,
                })
            }
            None => {
                debug!(contact_id, channel_id, company_id, "No open ticket for contact");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Ticket, TicketStatus};
    use crate::port::ticket_repository::mocks::InMemoryTicketRepository;

    fn guard_with(tickets: Vec<Ticket>) -> (DuplicateTicketGuard, Arc<InMemoryTicketRepository>) {
        let repo = Arc::new(InMemoryTicketRepository::new());
        for t in tickets {
            repo.put(t);
        }
        (DuplicateTicketGuard::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_open_ticket_conflicts_only_within_tenant() {
        let (guard, _) = guard_with(vec![Ticket::new(42, TicketStatus::Open, 7, 3, 1)]);

        let err = guard.check_no_open_ticket(7, 3, 1).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateOpenTicket { ticket_id: 42 }));

        assert!(guard.check_no_open_ticket(7, 3, 2).await.is_ok());
    }

    #[tokio::test]
    async fn test_pending_conflicts_closed_does_not() {
        let (guard, _) = guard_with(vec![
            Ticket::new(1, TicketStatus::Pending, 7, 3, 1),
            Ticket::new(2, TicketStatus::Closed, 8, 3, 1),
        ]);

        assert!(guard.check_no_open_ticket(7, 3, 1).await.is_err());
        assert!(guard.check_no_open_ticket(8, 3, 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_other_channel_is_not_a_conflict() {
        let (guard, _) = guard_with(vec![Ticket::new(1, TicketStatus::Open, 7, 3, 1)]);
        assert!(guard.check_no_open_ticket(7, 4, 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_identifiers_rejected_before_lookup() {
        let (guard, repo) = guard_with(vec![]);
        repo.set_failing_reads(true);

        let err = guard.check_no_open_ticket(0, 3, 1).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_not_treated_as_no_conflict() {
        let (guard, repo) = guard_with(vec![]);
        repo.set_failing_reads(true);

        let err = guard.check_no_open_ticket(7, 3, 1).await.unwrap_err();
        assert!(matches!(err, AppError::FetchFailure(_)));
    }
}
