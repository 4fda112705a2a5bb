//! Review form rules shared by create and edit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use epm_core::ValidationErrors;

use crate::Rating;

pub const MIN_GOALS_LEN: usize = 10;
pub const MAX_COMMENTS_LEN: usize = 500;

const REQUIRED: &str = "This field is required.";

/// Raw review submission as posted by the HTML form.
///
/// There is intentionally no employee-number field: the subject of a review
/// comes from the acting identity, and anything else a client posts is
/// dropped during deserialization.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub review_date: String,
    #[serde(default)]
    pub reviewer_id: String,
    #[serde(default)]
    pub overall_performance_rating: String,
    #[serde(default)]
    pub goals: String,
    #[serde(default)]
    pub reviewer_comments: String,
}

/// Validated, editable review fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewDraft {
    pub review_date: NaiveDate,
    pub reviewer_id: i64,
    pub overall_performance_rating: Rating,
    pub goals: String,
    pub reviewer_comments: String,
}

impl ReviewRequest {
    pub fn validate(self) -> Result<ReviewDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let review_date = match self.review_date.trim() {
            "" => {
                errors.push("review_date", REQUIRED);
                None
            }
            raw => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.push("review_date", "Not a valid date value.");
                    None
                }
            },
        };

        let reviewer_id = match self.reviewer_id.trim() {
            "" => {
                errors.push("reviewer_id", REQUIRED);
                None
            }
            raw => match raw.parse::<i64>() {
                Ok(v) if v >= 1 => Some(v),
                Ok(_) => {
                    errors.push("reviewer_id", "Reviewer ID must be a positive integer");
                    None
                }
                Err(_) => {
                    errors.push("reviewer_id", "Not a valid integer value.");
                    None
                }
            },
        };

        let rating = match self.overall_performance_rating.trim() {
            "" => {
                errors.push("overall_performance_rating", REQUIRED);
                None
            }
            raw => match raw.parse::<Rating>() {
                Ok(r) => Some(r),
                Err(_) => {
                    errors.push("overall_performance_rating", "Not a valid choice.");
                    None
                }
            },
        };

        let goals = self.goals.trim().to_string();
        if goals.is_empty() {
            errors.push("goals", REQUIRED);
        } else if goals.chars().count() < MIN_GOALS_LEN {
            errors.push(
                "goals",
                format!("Field must be at least {MIN_GOALS_LEN} characters long."),
            );
        }

        let reviewer_comments = self.reviewer_comments.trim().to_string();
        if reviewer_comments.is_empty() {
            errors.push("reviewer_comments", REQUIRED);
        } else if reviewer_comments.chars().count() > MAX_COMMENTS_LEN {
            errors.push("reviewer_comments", "Comments cannot exceed 500 characters");
        }

        match (review_date, reviewer_id, rating) {
            (Some(review_date), Some(reviewer_id), Some(overall_performance_rating))
                if errors.is_empty() =>
            {
                Ok(ReviewDraft {
                    review_date,
                    reviewer_id,
                    overall_performance_rating,
                    goals,
                    reviewer_comments,
                })
            }
            _ => Err(errors),
        }
    }
}
