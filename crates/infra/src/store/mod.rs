//! Persistence abstractions for employees and reviews.
//!
//! Every mutating operation is atomic: it either applies completely or leaves
//! the store unchanged and returns an error.

use async_trait::async_trait;
use thiserror::Error;

use epm_auth::{Employee, NewEmployee};
use epm_core::{EmployeeNumber, ReviewId};
use epm_reviews::{NewReview, Review, ReviewDraft};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryDatabase;
pub use postgres::PostgresDatabase;

/// Employee columns carrying a uniqueness constraint.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UniqueField {
    EmployeeNumber,
    Username,
    Email,
}

impl core::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            UniqueField::EmployeeNumber => "employee_number",
            UniqueField::Username => "username",
            UniqueField::Email => "email",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("duplicate {0}")]
    Duplicate(UniqueField),

    #[error("review references unknown employee {0}")]
    UnknownEmployee(EmployeeNumber),

    /// Driver/connection failure. The message is for logs only.
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn find_by_number(&self, number: EmployeeNumber) -> StoreResult<Option<Employee>>;

    /// Exact, case-sensitive match.
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Employee>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>>;

    /// Insert a new employee, enforcing uniqueness of number, username and email.
    async fn insert(&self, employee: NewEmployee) -> StoreResult<Employee>;

    async fn count(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Insert a review; its subject must be an existing employee.
    async fn create(&self, review: NewReview) -> StoreResult<Review>;

    async fn get_by_id(&self, id: ReviewId) -> StoreResult<Option<Review>>;

    async fn list_for_employee(&self, employee: EmployeeNumber) -> StoreResult<Vec<Review>>;

    async fn list_all(&self) -> StoreResult<Vec<Review>>;

    /// Replace the editable fields; `None` when the review does not exist.
    async fn update(&self, id: ReviewId, draft: ReviewDraft) -> StoreResult<Option<Review>>;

    /// `false` when the review did not exist.
    async fn delete(&self, id: ReviewId) -> StoreResult<bool>;
}

/// Listing order shared by all backends: newest review first, ties by id.
pub(crate) fn sort_for_listing(reviews: &mut [Review]) {
    reviews.sort_by(|a, b| {
        b.review_date
            .cmp(&a.review_date)
            .then_with(|| a.review_id.cmp(&b.review_id))
    });
}
