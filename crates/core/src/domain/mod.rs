// Domain Layer - Pure business logic and entities

pub mod error;
pub mod protection;
pub mod queue;
pub mod ticket;

// Re-exports
pub use error::DomainError;
pub use protection::{ProtectionStats, TransferProtectionEntry};
pub use queue::{Queue, QueueId, QueueLoad, QueueLoadSnapshot};
pub use ticket::{
    ensure_id, ChannelId, CompanyId, ContactId, Ticket, TicketId, TicketStatus, UserId,
    ACTIVE_STATUSES,
};
