// sqlx::Error -> AppError mapping
// Reads become FetchFailure, writes become Store (orphan rules prevent a From impl)

use ticketflow_core::error::AppError;

// Describe sqlx::Error with structured information
fn describe(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            match db_err.code().as_deref() {
                Some("2067") | Some("1555") => {
                    format!("Unique constraint violation: {}", db_err.message())
                }
                Some("787") | Some("3850") => {
                    format!("Foreign key constraint violation: {}", db_err.message())
                }
                Some("5") => format!("Database locked (SQLITE_BUSY): {}", db_err.message()),
                Some("13") => format!("Database full: {}", db_err.message()),
                Some(code) => format!("Database error [{}]: {}", code, db_err.message()),
                None => format!("Database error: {}", db_err.message()),
            }
        }
        sqlx::Error::RowNotFound => "Row not found".to_string(),
        sqlx::Error::ColumnNotFound(col) => format!("Column not found: {}", col),
        sqlx::Error::PoolTimedOut => "Connection pool timed out".to_string(),
        // Connection, pool, protocol errors
        other => other.to_string(),
    }
}

/// Map a failed read
pub(crate) fn fetch_error(err: sqlx::Error) -> AppError {
    AppError::FetchFailure(describe(&err))
}

/// Map a failed write
pub(crate) fn store_error(err: sqlx::Error) -> AppError {
    AppError::Store(describe(&err))
}
