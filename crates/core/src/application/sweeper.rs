// Protection Sweeper
// Periodic backstop eviction for tickets nobody asks about anymore

use crate::application::shutdown::ShutdownToken;
use crate::application::transfer_protection::TransferProtectionCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Sweeper
///
/// Runs `sweep_expired` every `sweep_interval` until shutdown, then clears
/// the cache so no protection outlives the process that granted it.
pub struct ProtectionSweeper {
    cache: Arc<TransferProtectionCache>,
    sweep_interval: Duration,
}

impl ProtectionSweeper {
    /// Create a new sweeper
    ///
    /// # Arguments
    /// * `cache` - Cache to sweep
    /// * `sweep_interval` - Time between sweeps
    pub fn new(cache: Arc<TransferProtectionCache>, sweep_interval: Duration) -> Self {
        Self {
            cache,
            sweep_interval,
        }
    }

    /// Run sweep loop (background task)
    ///
    /// Should be spawned in tokio::spawn. Returns the total number of
    /// entries removed by sweeps.
    pub async fn run(self, mut shutdown: ShutdownToken) -> usize {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            window_secs = self.cache.window().as_secs(),
            "Protection sweeper started"
        );

        let mut tick = interval(self.sweep_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately; nothing can have expired yet
        tick.tick().await;

        let mut swept_total = 0;
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let removed = self.cache.sweep_expired();
                    swept_total += removed;
                    let stats = self.cache.stats();
                    debug!(
                        removed,
                        total = stats.total,
                        protected = stats.protected_count,
                        "Protection sweep tick"
                    );
                }
                _ = shutdown.wait() => {
                    break;
                }
            }
        }

        let dropped = self.cache.clear();
        info!(
            swept_total,
            dropped_on_shutdown = dropped,
            "Protection sweeper stopped"
        );
        swept_total
    }

    /// Sweep immediately (for manual trigger)
    pub fn run_now(&self) -> usize {
        self.cache.sweep_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::shutdown::shutdown_channel;
    use crate::application::transfer_protection::ProtectionConfig;
    use crate::port::time_provider::mocks::ManualClock;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_on_tick_and_clears_on_shutdown() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = Arc::new(TransferProtectionCache::new(
            ProtectionConfig {
                window: Duration::from_secs(60),
            },
            clock.clone(),
        ));
        cache.mark_manual_transfer(1, 10, 1);
        cache.mark_manual_transfer(2, 10, 1);

        let (tx, token) = shutdown_channel();
        let sweeper = ProtectionSweeper::new(cache.clone(), Duration::from_secs(5));
        let handle = tokio::spawn(sweeper.run(token));

        // Ticket 1 expires, ticket 2 is refreshed
        clock.set(61_000);
        cache.mark_manual_transfer(2, 11, 1);
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert!(cache.entry(1).is_none(), "expired entry swept");
        assert!(cache.entry(2).is_some(), "fresh entry kept");

        tx.shutdown();
        let swept = handle.await.unwrap();
        assert_eq!(swept, 1);
        assert_eq!(cache.stats().total, 0);
    }

    #[test]
    fn test_run_now() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = Arc::new(TransferProtectionCache::new(
            ProtectionConfig::default(),
            clock.clone(),
        ));
        cache.mark_manual_transfer(1, 10, 1);
        clock.set(11 * 60_000);

        let sweeper = ProtectionSweeper::new(cache, Duration::from_secs(60));
        assert_eq!(sweeper.run_now(), 1);
    }
}
