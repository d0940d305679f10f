// Transfer Protection Domain Model

use crate::domain::queue::QueueId;
use crate::domain::ticket::{TicketId, UserId};
use serde::{Deserialize, Serialize};

/// Marker left by a manual transfer
///
/// The entry is its own expiry record: it is protected while
/// `now - placed_at <= window`, so replacing it also replaces its deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProtectionEntry {
    pub ticket_id: TicketId,
    pub placed_at: i64, // epoch ms
    pub placed_by_user_id: UserId,
    pub target_queue_id: QueueId,
}

impl TransferProtectionEntry {
    pub fn new(
        ticket_id: TicketId,
        placed_at: i64,
        placed_by_user_id: UserId,
        target_queue_id: QueueId,
    ) -> Self {
        Self {
            ticket_id,
            placed_at,
            placed_by_user_id,
            target_queue_id,
        }
    }

    /// Elapsed milliseconds, clamped at zero if the clock went backwards
    pub fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.placed_at).max(0)
    }

    /// Inclusive window check
    pub fn is_within(&self, now_millis: i64, window_millis: i64) -> bool {
        self.age_millis(now_millis) <= window_millis
    }

    /// Saturates at `i64::MAX` for windows too large to represent
    pub fn expires_at(&self, window_millis: i64) -> i64 {
        self.placed_at.saturating_add(window_millis)
    }
}

/// Cache counters
///
/// `total` includes expired entries that have not been evicted yet, so
/// `total >= protected_count` and the gap is eviction lag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionStats {
    pub total: usize,
    pub protected_count: usize,
}

impl ProtectionStats {
    pub fn expired_pending_eviction(&self) -> usize {
        self.total - self.protected_count
    }
}
