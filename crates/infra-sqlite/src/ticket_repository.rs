// SQLite TicketRepository Implementation

use crate::error::{fetch_error, store_error};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;
use ticketflow_core::domain::{
    ChannelId, CompanyId, ContactId, QueueId, Ticket, TicketId, TicketStatus, ACTIVE_STATUSES,
};
use ticketflow_core::error::{AppError, Result};
use ticketflow_core::port::{TicketRepository, TimeProvider};

const TICKET_COLUMNS: &str = "id, status, queue_id, contact_id, channel_id, company_id";

pub struct SqliteTicketRepository {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteTicketRepository {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

// Append `AND status IN (...)`; an empty set matches nothing
fn push_status_filter(qb: &mut QueryBuilder<'_, Sqlite>, statuses: &[TicketStatus]) {
    if statuses.is_empty() {
        qb.push(" AND 0");
        return;
    }
    qb.push(" AND status IN (");
    let mut separated = qb.separated(", ");
    for status in statuses {
        separated.push_bind(status.as_str().to_owned());
    }
    separated.push_unseparated(")");
}

#[async_trait]
impl TicketRepository for SqliteTicketRepository {
    async fn insert(&self, ticket: &Ticket) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tickets (
                id, status, queue_id, contact_id, channel_id, company_id, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(ticket.id)
        .bind(ticket.status.as_str())
        .bind(ticket.queue_id)
        .bind(ticket.contact_id)
        .bind(ticket.channel_id)
        .bind(ticket.company_id)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>> {
        let row: Option<TicketRow> =
            sqlx::query_as(&format!("SELECT {} FROM tickets WHERE id = ?", TICKET_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(fetch_error)?;

        row.map(TicketRow::into_ticket).transpose()
    }

    async fn count_active_tickets(
        &self,
        queue_id: QueueId,
        company_id: CompanyId,
        statuses: &[TicketStatus],
    ) -> Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tickets WHERE queue_id = ");
        qb.push_bind(queue_id);
        qb.push(" AND company_id = ");
        qb.push_bind(company_id);
        push_status_filter(&mut qb, statuses);

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(fetch_error)
    }

    async fn find_open_ticket(
        &self,
        contact_id: ContactId,
        channel_id: ChannelId,
        company_id: CompanyId,
    ) -> Result<Option<Ticket>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM tickets WHERE contact_id = ",
            TICKET_COLUMNS
        ));
        qb.push_bind(contact_id);
        qb.push(" AND channel_id = ");
        qb.push_bind(channel_id);
        qb.push(" AND company_id = ");
        qb.push_bind(company_id);
        push_status_filter(&mut qb, &ACTIVE_STATUSES);
        qb.push(" ORDER BY id ASC LIMIT 1");

        let row: Option<TicketRow> = qb
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(fetch_error)?;

        row.map(TicketRow::into_ticket).transpose()
    }

    async fn list_active_tickets(
        &self,
        queue_id: QueueId,
        company_id: CompanyId,
        statuses: &[TicketStatus],
    ) -> Result<Vec<Ticket>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM tickets WHERE queue_id = ",
            TICKET_COLUMNS
        ));
        qb.push_bind(queue_id);
        qb.push(" AND company_id = ");
        qb.push_bind(company_id);
        push_status_filter(&mut qb, statuses);
        qb.push(" ORDER BY id ASC");

        let rows: Vec<TicketRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(fetch_error)?;

        rows.into_iter().map(TicketRow::into_ticket).collect()
    }

    async fn assign_queue(&self, ticket_id: TicketId, queue_id: QueueId) -> Result<()> {
        let result = sqlx::query("UPDATE tickets SET queue_id = ?, updated_at = ? WHERE id = ?")
            .bind(queue_id)
            .bind(self.time_provider.now_millis())
            .bind(ticket_id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Ticket {} not found", ticket_id)));
        }
        Ok(())
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: i64,
    status: String,
    queue_id: Option<i64>,
    contact_id: i64,
    channel_id: i64,
    company_id: i64,
}

impl TicketRow {
    fn into_ticket(self) -> Result<Ticket> {
        let status = self.status.parse::<TicketStatus>().map_err(|e| {
            AppError::FetchFailure(format!("Ticket {} has unreadable status: {}", self.id, e))
        })?;

        Ok(Ticket {
            id: self.id,
            status,
            queue_id: self.queue_id,
            contact_id: self.contact_id,
            channel_id: self.channel_id,
            company_id: self.company_id,
        })
    }
}
