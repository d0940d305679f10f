//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes (ADR-020).

use jsonrpsee::types::ErrorObjectOwned;
use serde_json::json;
use ticketflow_core::error::AppError;

/// RPC Error Codes (ADR-020)
pub mod code {
    pub const INVALID_ARGUMENT: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const NO_QUEUES: i32 = 4004;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const FETCH_FAILURE: i32 = 5001;
    pub const STORE_ERROR: i32 = 5002;
}

/// Convert AppError to JSON-RPC ErrorObject
///
/// Conflict and no-queue errors carry structured data so callers can show
/// the existing ticket or the tenant without parsing the message.
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let message = err.to_string();
    match err {
        AppError::DuplicateOpenTicket { ticket_id } => ErrorObjectOwned::owned(
            code::CONFLICT,
            message,
            Some(json!({ "existing_ticket_id": ticket_id })),
        ),
        AppError::NoQueuesAvailable { company_id } => ErrorObjectOwned::owned(
            code::NO_QUEUES,
            message,
            Some(json!({ "company_id": company_id })),
        ),
        AppError::FetchFailure(_) => ErrorObjectOwned::owned(
            code::FETCH_FAILURE,
            message,
            Some(json!({ "retryable": true })),
        ),
        AppError::Store(_) => ErrorObjectOwned::owned(
            code::STORE_ERROR,
            message,
            Some(json!({ "retryable": true })),
        ),
        AppError::InvalidArgument(_) => {
            ErrorObjectOwned::owned(code::INVALID_ARGUMENT, message, None::<()>)
        }
        AppError::NotFound(_) => ErrorObjectOwned::owned(code::NOT_FOUND, message, None::<()>),
        AppError::Config(_) | AppError::Internal(_) => {
            ErrorObjectOwned::owned(code::INTERNAL_ERROR, message, None::<()>)
        }
    }
}
