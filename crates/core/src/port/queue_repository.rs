// Queue Repository Port (Interface)

use crate::domain::{CompanyId, Queue, QueueId};
use crate::error::Result;
use async_trait::async_trait;

/// Read-only access to the tenant's queues
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// List queues of a company, ascending by id
    async fn list_queues(&self, company_id: CompanyId) -> Result<Vec<Queue>>;

    /// Find queue by ID
    async fn find_queue(&self, queue_id: QueueId) -> Result<Option<Queue>>;

    /// All companies owning at least one queue (for rebalancing passes)
    async fn list_company_ids(&self) -> Result<Vec<CompanyId>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// In-memory queue store
    #[derive(Default)]
    pub struct InMemoryQueueRepository {
        queues: Mutex<Vec<Queue>>,
        failing: AtomicBool,
    }

    impl InMemoryQueueRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_queues(queues: Vec<Queue>) -> Self {
            Self {
                queues: Mutex::new(queues),
                failing: AtomicBool::new(false),
            }
        }

        pub fn add(&self, queue: Queue) {
            self.queues.lock().unwrap().push(queue);
        }

        /// Make every call fail with FetchFailure
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AppError::FetchFailure("queue store unavailable".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl QueueRepository for InMemoryQueueRepository {
        async fn list_queues(&self, company_id: CompanyId) -> Result<Vec<Queue>> {
            self.check()?;
            let mut queues: Vec<Queue> = self
                .queues
                .lock()
                .unwrap()
                .iter()
                .filter(|q| q.company_id == company_id)
                .cloned()
                .collect();
            queues.sort_by_key(|q| q.id);
            Ok(queues)
        }

        async fn find_queue(&self, queue_id: QueueId) -> Result<Option<Queue>> {
            self.check()?;
            Ok(self
                .queues
                .lock()
                .unwrap()
                .iter()
                .find(|q| q.id == queue_id)
                .cloned())
        }

        async fn list_company_ids(&self) -> Result<Vec<CompanyId>> {
            self.check()?;
            let mut ids: Vec<CompanyId> = self
                .queues
                .lock()
                .unwrap()
                .iter()
                .map(|q| q.company_id)
                .collect();
            ids.sort_unstable();
            ids.dedup();
            Ok(ids)
        }
    }
}
