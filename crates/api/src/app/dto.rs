//! JSON view documents rendered by the form routes.
//!
//! Each response names its `view` so a template layer can pick the page;
//! pending notices are drained into every rendered view.

use serde::Serialize;

use epm_auth::{Identity, Notice};
use epm_core::{ReviewId, ValidationErrors};
use epm_reviews::{Rating, Review, ReviewDraft, ReviewRequest};

#[derive(Debug, Serialize)]
pub struct FormView {
    pub view: &'static str,
    pub notices: Vec<Notice>,
    #[serde(skip_serializing_if = "ValidationErrors::is_empty")]
    pub errors: ValidationErrors,
}

impl FormView {
    pub fn new(view: &'static str, notices: Vec<Notice>) -> Self {
        Self {
            view,
            notices,
            errors: ValidationErrors::new(),
        }
    }

    pub fn with_errors(mut self, errors: ValidationErrors) -> Self {
        self.errors = errors;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub view: &'static str,
    pub identity: Identity,
    pub all_reviews: bool,
    pub reviews: Vec<Review>,
    pub notices: Vec<Notice>,
}

/// Values a review form is pre-populated with.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReviewValues {
    Saved(ReviewDraft),
    /// Raw fields echoed back after a rejected submission.
    Submitted(ReviewRequest),
}

/// Create/edit review page.
#[derive(Debug, Serialize)]
pub struct ReviewFormView {
    pub view: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewValues>,
    pub ratings: Vec<&'static str>,
    pub notices: Vec<Notice>,
    #[serde(skip_serializing_if = "ValidationErrors::is_empty")]
    pub errors: ValidationErrors,
}

impl ReviewFormView {
    pub fn create(notices: Vec<Notice>) -> Self {
        Self {
            view: "create_review",
            review_id: None,
            review: None,
            ratings: rating_choices(),
            notices,
            errors: ValidationErrors::new(),
        }
    }

    pub fn edit(review: &Review, notices: Vec<Notice>) -> Self {
        Self {
            view: "edit_review",
            review_id: Some(review.review_id.get()),
            review: Some(ReviewValues::Saved(review.draft())),
            ratings: rating_choices(),
            notices,
            errors: ValidationErrors::new(),
        }
    }

    /// Edit page re-rendered after a rejected submission.
    pub fn rejected_edit(
        review_id: ReviewId,
        submitted: ReviewRequest,
        notices: Vec<Notice>,
        errors: ValidationErrors,
    ) -> Self {
        Self {
            view: "edit_review",
            review_id: Some(review_id.get()),
            review: Some(ReviewValues::Submitted(submitted)),
            ratings: rating_choices(),
            notices,
            errors,
        }
    }

    /// Keep what the user typed alongside the field errors.
    pub fn rejected(mut self, submitted: ReviewRequest, errors: ValidationErrors) -> Self {
        self.review = Some(ReviewValues::Submitted(submitted));
        self.errors = errors;
        self
    }
}

fn rating_choices() -> Vec<&'static str> {
    Rating::ALL.iter().map(Rating::as_str).collect()
}
