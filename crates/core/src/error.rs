// Central Error Type for the Application

use crate::domain::{CompanyId, DomainError, TicketId};
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Contact already holds an open/pending ticket on this channel
    #[error("Duplicate open ticket: contact already has ticket {ticket_id} open on this channel")]
    DuplicateOpenTicket { ticket_id: TicketId },

    /// Tenant has no queues configured (not fatal, ticket stays unassigned)
    #[error("No queues available for company {company_id}")]
    NoQueuesAvailable { company_id: CompanyId },

    /// Reading queues/tickets failed (transient, caller may retry)
    #[error("Fetch failure: {0}")]
    FetchFailure(String),

    /// Writing an assignment failed
    #[error("Store error: {0}")]
    Store(String),

    /// Caller passed a missing or malformed argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a caller may retry the same operation with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::FetchFailure(_) | AppError::Store(_))
    }
}

// Every domain rule violation reaching the application layer is a caller defect
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::InvalidArgument(err.to_string())
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by converting to AppError::FetchFailure / AppError::Store
