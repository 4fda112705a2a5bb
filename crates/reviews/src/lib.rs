//! Performance-review domain module.
//!
//! This crate contains the review record and its form rules, implemented as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod form;
pub mod rating;
pub mod review;

pub use form::{ReviewDraft, ReviewRequest};
pub use rating::{Rating, UnknownRating};
pub use review::{NewReview, Review};
