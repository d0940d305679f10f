// Port Layer - Interfaces for external dependencies

pub mod queue_repository;
pub mod ticket_repository;
pub mod time_provider;

// Re-exports
pub use queue_repository::QueueRepository;
pub use ticket_repository::TicketRepository;
pub use time_provider::TimeProvider;
