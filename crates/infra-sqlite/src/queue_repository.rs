// SQLite QueueRepository Implementation

use crate::error::{fetch_error, store_error};
use async_trait::async_trait;
use sqlx::SqlitePool;
use ticketflow_core::domain::{CompanyId, Queue, QueueId};
use ticketflow_core::error::Result;
use ticketflow_core::port::QueueRepository;

pub struct SqliteQueueRepository {
    pool: SqlitePool,
}

impl SqliteQueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a queue (provisioning and tests; the core never creates queues)
    pub async fn create_queue(&self, name: &str, company_id: CompanyId) -> Result<Queue> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO queues (name, company_id) VALUES (?, ?) RETURNING id",
        )
        .bind(name)
        .bind(company_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(Queue::new(id, name, company_id))
    }
}

#[async_trait]
impl QueueRepository for SqliteQueueRepository {
    async fn list_queues(&self, company_id: CompanyId) -> Result<Vec<Queue>> {
        let rows: Vec<QueueRow> = sqlx::query_as(
            "SELECT id, name, company_id FROM queues WHERE company_id = ? ORDER BY id ASC",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(fetch_error)?;

        Ok(rows.into_iter().map(QueueRow::into_queue).collect())
    }

    async fn find_queue(&self, queue_id: QueueId) -> Result<Option<Queue>> {
        let row: Option<QueueRow> =
            sqlx::query_as("SELECT id, name, company_id FROM queues WHERE id = ?")
                .bind(queue_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(fetch_error)?;

        Ok(row.map(QueueRow::into_queue))
    }

    async fn list_company_ids(&self) -> Result<Vec<CompanyId>> {
        sqlx::query_scalar("SELECT DISTINCT company_id FROM queues ORDER BY company_id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(fetch_error)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct QueueRow {
    id: i64,
    name: String,
    company_id: i64,
}

impl QueueRow {
    fn into_queue(self) -> Queue {
        Queue::new(self.id, self.name, self.company_id)
    }
}
