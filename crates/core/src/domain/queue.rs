// Queue Domain Model

use crate::domain::ticket::CompanyId;
use serde::{Deserialize, Serialize};

/// Queue identifier (ascending order is the canonical tie-break)
pub type QueueId = i64;

/// Queue (read-only to this core)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub id: QueueId,
    pub name: String,
    pub company_id: CompanyId,
}

impl Queue {
    pub fn new(id: QueueId, name: impl Into<String>, company_id: CompanyId) -> Self {
        Self {
            id,
            name: name.into(),
            company_id,
        }
    }
}

/// Active ticket count of one queue at snapshot time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueLoad {
    pub queue_id: QueueId,
    pub name: String,
    pub active_tickets: i64,
}

/// Per-tenant load snapshot, recomputed for every balancing decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueLoadSnapshot {
    pub company_id: CompanyId,
    pub taken_at: i64,
    loads: Vec<QueueLoad>,
}

impl QueueLoadSnapshot {
    /// Build a snapshot; loads are kept sorted by (count, queue id)
    pub fn new(company_id: CompanyId, taken_at: i64, mut loads: Vec<QueueLoad>) -> Self {
        sort_by_load(&mut loads);
        Self {
            company_id,
            taken_at,
            loads,
        }
    }

    pub fn loads(&self) -> &[QueueLoad] {
        &self.loads
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// Least loaded queue, lowest id on ties
    pub fn least_loaded(&self) -> Option<&QueueLoad> {
        self.loads.first()
    }

    /// Most loaded queue, lowest id on ties
    pub fn most_loaded(&self) -> Option<&QueueLoad> {
        let max = self.loads.last()?.active_tickets;
        self.loads.iter().find(|l| l.active_tickets == max)
    }

    /// Difference between most and least loaded queue
    pub fn spread(&self) -> i64 {
        match (self.loads.first(), self.loads.last()) {
            (Some(min), Some(max)) => max.active_tickets - min.active_tickets,
            _ => 0,
        }
    }

    /// Move one ticket between queues in the snapshot (keeps ordering)
    pub fn record_move(&mut self, from: QueueId, to: QueueId) {
        for load in self.loads.iter_mut() {
            if load.queue_id == from {
                load.active_tickets -= 1;
            } else if load.queue_id == to {
                load.active_tickets += 1;
            }
        }
        sort_by_load(&mut self.loads);
    }
}

fn sort_by_load(loads: &mut [QueueLoad]) {
    loads.sort_by(|a, b| {
        a.active_tickets
            .cmp(&b.active_tickets)
            .then_with(|| a.queue_id.cmp(&b.queue_id))
    });
}
