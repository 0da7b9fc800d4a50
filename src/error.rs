// Error taxonomy for store operations

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Database could not be reached: open failure, busy/locked, I/O.
    #[error("Store unavailable: {0}")]
    Connectivity(#[source] rusqlite::Error),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,

    /// Constraint violation such as a duplicate task id.
    #[error("Constraint violation: {0}")]
    Integrity(#[source] rusqlite::Error),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, StoreError::Integrity(_))
    }

    /// Connectivity in the broad sense: unreachable store or an ended context.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            StoreError::Connectivity(_) | StoreError::Cancelled | StoreError::DeadlineExceeded
        )
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => StoreError::Integrity(err),
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::NotADatabase,
            ) => StoreError::Connectivity(err),
            // Interrupts only come from the context's progress handler; the
            // caller maps them to Cancelled/DeadlineExceeded when it can.
            Some(ErrorCode::OperationInterrupted) => StoreError::Cancelled,
            _ => StoreError::Sqlite(err),
        }
    }
}
