use thiserror::Error;

use crate::store::StoreError;

/// Failures surfaced by the lifecycle services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed ids or bodies, missing fields, unknown breed, out-of-range target count
    #[error("{0}")]
    InvalidInput(String),

    /// The addressed row does not exist
    #[error("{0}")]
    NotFound(String),

    /// The request clashes with the current state of another record
    #[error("{0}")]
    Conflict(String),

    /// The request is not allowed in the record's current lifecycle state
    #[error("{0}")]
    InvalidOperation(String),

    #[error("internal error: {0}")]
    Internal(StoreError),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::InvalidInput(_) => "invalid_input",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::InvalidOperation(_) => "invalid_operation",
            ServiceError::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Internal(other),
        }
    }
}

/// Map a foreign key failure on `missions.cat_id` to a caller error
pub(crate) fn unknown_cat(err: StoreError) -> ServiceError {
    match err {
        StoreError::ForeignKeyViolation(_) => {
            ServiceError::InvalidInput("invalid cat ID: the specified cat does not exist".into())
        }
        other => other.into(),
    }
}
