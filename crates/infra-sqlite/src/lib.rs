// Ticketflow Infrastructure - SQLite Adapter
// Implements: QueueRepository, TicketRepository

mod connection;
mod error;
mod migration;
mod queue_repository;
mod ticket_repository;

pub use connection::create_pool;
pub use migration::run_migrations;
pub use queue_repository::SqliteQueueRepository;
pub use ticket_repository::SqliteTicketRepository;

// Note: sqlx::Error conversion is handled by helper functions in `error`
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
