// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid identifier {field}: {value}")]
    InvalidIdentifier { field: &'static str, value: i64 },

    #[error("Invalid ticket status: {0:?}")]
    InvalidStatus(String),

    #[error("Queue {queue_id} does not belong to company {company_id}")]
    QueueOutsideTenant { queue_id: i64, company_id: i64 },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
