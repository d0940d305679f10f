// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod duplicate_guard;
pub mod load_balancer;
pub mod rebalance;
pub mod routing;
pub mod shutdown;
pub mod sweeper;
pub mod transfer_protection;

// Re-exports
pub use duplicate_guard::DuplicateTicketGuard;
pub use load_balancer::QueueLoadBalancer;
pub use rebalance::{RebalanceConfig, RebalanceReport, RebalanceScheduler, RebalanceService};
pub use routing::{RoutingDecision, TicketRoutingService, TransferReceipt, UnassignedReason};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use sweeper::ProtectionSweeper;
pub use transfer_protection::{ProtectionConfig, TransferProtectionCache};
