use chrono::NaiveDate;
use serde::Serialize;

use epm_core::{EmployeeNumber, Entity, Owned, ReviewId};

use crate::{Rating, ReviewDraft};

/// A single performance-review record tied to one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub review_id: ReviewId,
    /// The subject of the review.
    pub employee_number: EmployeeNumber,
    pub review_date: NaiveDate,
    pub reviewer_id: i64,
    pub overall_performance_rating: Rating,
    pub goals: String,
    pub reviewer_comments: String,
}

impl Review {
    /// Overwrite the editable fields; identity and subject never change.
    pub fn apply(&mut self, draft: ReviewDraft) {
        self.review_date = draft.review_date;
        self.reviewer_id = draft.reviewer_id;
        self.overall_performance_rating = draft.overall_performance_rating;
        self.goals = draft.goals;
        self.reviewer_comments = draft.reviewer_comments;
    }

    /// The editable fields, e.g. to pre-populate an edit form.
    pub fn draft(&self) -> ReviewDraft {
        ReviewDraft {
            review_date: self.review_date,
            reviewer_id: self.reviewer_id,
            overall_performance_rating: self.overall_performance_rating,
            goals: self.goals.clone(),
            reviewer_comments: self.reviewer_comments.clone(),
        }
    }
}

impl Entity for Review {
    type Id = ReviewId;

    fn id(&self) -> &Self::Id {
        &self.review_id
    }
}

impl Owned for Review {
    fn owner(&self) -> EmployeeNumber {
        self.employee_number
    }
}

/// Review ready to be inserted; the store assigns `review_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub employee_number: EmployeeNumber,
    pub draft: ReviewDraft,
}

impl NewReview {
    pub fn new(employee_number: EmployeeNumber, draft: ReviewDraft) -> Self {
        Self {
            employee_number,
            draft,
        }
    }

    pub fn into_review(self, review_id: ReviewId) -> Review {
        Review {
            review_id,
            employee_number: self.employee_number,
            review_date: self.draft.review_date,
            reviewer_id: self.draft.reviewer_id,
            overall_performance_rating: self.draft.overall_performance_rating,
            goals: self.draft.goals,
            reviewer_comments: self.draft.reviewer_comments,
        }
    }
}

impl Owned for NewReview {
    fn owner(&self) -> EmployeeNumber {
        self.employee_number
    }
}
