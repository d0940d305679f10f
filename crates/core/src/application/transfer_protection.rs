//! Transfer Protection Cache
//!
//! Remembers which tickets an agent moved by hand so the automated rebalancer
//! leaves them alone for a while.
//!
//! Expiry is a property of each entry (`placed_at + window`), checked on read
//! (lazy eviction) and by a periodic sweep. There are no per-entry timers.
//!
//! In-memory and per process: another instance of the service has its own,
//! unrelated view. Nothing here is persisted.

use crate::application::constants::{DEFAULT_PROTECTION_WINDOW, MILLIS_PER_MINUTE};
use crate::domain::{ProtectionStats, QueueId, TicketId, TransferProtectionEntry, UserId};
use crate::port::TimeProvider;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

/// Protection configuration
#[derive(Debug, Clone)]
pub struct ProtectionConfig {
    /// How long a manual transfer is shielded from automated moves
    pub window: Duration,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_PROTECTION_WINDOW,
        }
    }
}

/// Process-local, time-windowed set of manually placed tickets
///
/// One mutex guards the whole map: every read, write and sweep decides under
/// the same lock, so a sweep cannot drop an entry written concurrently.
pub struct TransferProtectionCache {
    entries: Mutex<HashMap<TicketId, TransferProtectionEntry>>,
    window_millis: i64,
    time_provider: Arc<dyn TimeProvider>,
}

impl TransferProtectionCache {
    pub fn new(config: ProtectionConfig, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            window_millis: i64::try_from(config.window.as_millis()).unwrap_or(i64::MAX),
            time_provider,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_millis as u64)
    }

    // Every mutation is a single map operation; a poisoned lock is still consistent
    fn lock(&self) -> MutexGuard<'_, HashMap<TicketId, TransferProtectionEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record (or overwrite) the protection entry for a manually moved ticket
    ///
    /// Overwriting starts a brand-new window from now.
    pub fn mark_manual_transfer(&self, ticket_id: TicketId, user_id: UserId, queue_id: QueueId) {
        let now = self.time_provider.now_millis();
        let entry = TransferProtectionEntry::new(ticket_id, now, user_id, queue_id);
        let expires_at = entry.expires_at(self.window_millis);

        let previous = self.lock().insert(ticket_id, entry);

        info!(
            ticket_id,
            user_id,
            queue_id,
            expires_at,
            replaced = previous.is_some(),
            "Manual transfer protection granted"
        );
    }

    /// True iff an entry exists and is still inside the window
    ///
    /// Not a pure read: an expired entry is removed here.
    pub fn is_protected(&self, ticket_id: TicketId) -> bool {
        let now = self.time_provider.now_millis();
        let mut entries = self.lock();

        let Some(entry) = entries.get(&ticket_id) else {
            return false;
        };

        if entry.is_within(now, self.window_millis) {
            return true;
        }

        let age_millis = entry.age_millis(now);
        entries.remove(&ticket_id);
        drop(entries);

        info!(ticket_id, age_millis, "Transfer protection expired");
        false
    }

    /// Whole minutes since the transfer, `None` if there is no entry
    ///
    /// Does not evict: an expired but not yet evicted entry still reports
    /// its age.
    pub fn transfer_age_minutes(&self, ticket_id: TicketId) -> Option<i64> {
        let now = self.time_provider.now_millis();
        self.lock()
            .get(&ticket_id)
            .map(|entry| entry.age_millis(now) / MILLIS_PER_MINUTE)
    }

    /// Current entry without eviction
    pub fn entry(&self, ticket_id: TicketId) -> Option<TransferProtectionEntry> {
        self.lock().get(&ticket_id).cloned()
    }

    /// Drop protection for a ticket; no-op when absent
    pub fn remove_protection(&self, ticket_id: TicketId) {
        if self.lock().remove(&ticket_id).is_some() {
            debug!(ticket_id, "Transfer protection removed");
        }
    }

    /// Remove every entry older than the window, returning how many went
    pub fn sweep_expired(&self) -> usize {
        let now = self.time_provider.now_millis();
        let window = self.window_millis;

        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_within(now, window));
        let removed = before - entries.len();
        let remaining = entries.len();
        drop(entries);

        if removed > 0 {
            info!(removed, remaining, "Swept expired transfer protections");
        } else {
            debug!(remaining, "Transfer protection sweep found nothing to remove");
        }
        removed
    }

    /// Raw entry count and count of entries still inside the window
    pub fn stats(&self) -> ProtectionStats {
        let now = self.time_provider.now_millis();
        let entries = self.lock();
        ProtectionStats {
            total: entries.len(),
            protected_count: entries
                .values()
                .filter(|e| e.is_within(now, self.window_millis))
                .count(),
        }
    }

    /// Drop everything (shutdown)
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        removed
    }
}
