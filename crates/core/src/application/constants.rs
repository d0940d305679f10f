// Distribution constants (ADR: No magic values)
use std::time::Duration;

/// How long a manual transfer shields a ticket from the rebalancer (10 minutes)
pub const DEFAULT_PROTECTION_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Largest accepted protection window (30 days)
pub const MAX_PROTECTION_WINDOW: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// How often expired protection entries are swept (1 minute)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// How often the automated rebalancer runs (2 minutes)
pub const DEFAULT_REBALANCE_INTERVAL: Duration = Duration::from_secs(2 * 60);

/// Largest tolerated difference between most and least loaded queue
pub const DEFAULT_REBALANCE_MAX_SPREAD: i64 = 1;

/// Upper bound on tickets moved per company in one pass
pub const DEFAULT_REBALANCE_MAX_MOVES: usize = 50;

pub const MILLIS_PER_MINUTE: i64 = 60_000;
