use thiserror::Error;

use epm_auth::{AuthzError, ReviewAction};
use epm_core::ValidationErrors;

use crate::store::{StoreError, UniqueField};

/// Errors surfaced by the application services.
///
/// `Persistence` deliberately carries no detail; the underlying cause is
/// logged where it is converted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Invalid username or password. Please try again")]
    InvalidCredentials,

    #[error("Email address already exists.")]
    DuplicateEmail,

    #[error("Username already exists.")]
    DuplicateUsername,

    #[error("This employee number already exists. Please log in instead.")]
    DuplicateEmployeeNumber,

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("not found")]
    NotFound,

    #[error("forbidden: may not {0} this review")]
    Forbidden(ReviewAction),

    #[error("An unexpected error occurred. Please try again.")]
    Persistence,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(action) => ServiceError::Forbidden(action),
        }
    }
}

impl From<UniqueField> for ServiceError {
    fn from(field: UniqueField) -> Self {
        match field {
            UniqueField::Email => ServiceError::DuplicateEmail,
            UniqueField::Username => ServiceError::DuplicateUsername,
            UniqueField::EmployeeNumber => ServiceError::DuplicateEmployeeNumber,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => field.into(),
            StoreError::UnknownEmployee(number) => {
                tracing::warn!(employee_number = %number, "write referenced a missing employee");
                ServiceError::NotFound
            }
            StoreError::Backend(detail) => {
                tracing::error!(error = %detail, "persistence failure");
                ServiceError::Persistence
            }
        }
    }
}
