use thiserror::Error;

use marketplace_core::DomainError;

use crate::entity_store::StoreError;

/// Failure of a service operation.
///
/// Constraint violations reported by the store are business failures (a lost
/// email race, a record gained a dependent) and are folded into the matching
/// domain errors. Everything else from the store stays a `Store` error.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store failure: {0}")]
    Store(StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation(msg) => ServiceError::Domain(DomainError::conflict(msg)),
            StoreError::ForeignKeyViolation(msg) => ServiceError::Domain(DomainError::policy(msg)),
            StoreError::CheckViolation(msg) => ServiceError::Domain(DomainError::validation(msg)),
            other => ServiceError::Store(other),
        }
    }
}

impl ServiceError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) => Some(e),
            ServiceError::Store(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_becomes_conflict() {
        let err = ServiceError::from(StoreError::UniqueViolation("buyers.email".to_string()));
        assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));
    }

    #[test]
    fn foreign_key_violation_becomes_policy() {
        let err = ServiceError::from(StoreError::ForeignKeyViolation("items.seller_id".to_string()));
        assert!(matches!(err, ServiceError::Domain(DomainError::PolicyViolation(_))));
    }

    #[test]
    fn check_violation_becomes_validation() {
        let err = ServiceError::from(StoreError::CheckViolation("items.price".to_string()));
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
    }

    #[test]
    fn backend_errors_stay_store_errors() {
        let err = ServiceError::from(StoreError::Backend("connection reset".to_string()));
        assert!(matches!(err, ServiceError::Store(StoreError::Backend(_))));
        assert!(err.domain().is_none());
    }
}
