//! `epm-core`: shared building blocks for the performance-review domain.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;

pub use entity::{Entity, Owned};
pub use error::{DomainError, FieldError, ValidationErrors};
pub use id::{EmployeeNumber, ReviewId};
