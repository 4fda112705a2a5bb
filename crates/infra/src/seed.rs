//! Demo data for development environments.

use chrono::NaiveDate;

use epm_auth::{NewEmployee, hash_password};
use epm_core::EmployeeNumber;
use epm_reviews::{NewReview, Rating, ReviewDraft};

use crate::store::{EmployeeStore, ReviewStore, StoreError, StoreResult};

pub const DEMO_EMPLOYEE_NUMBER: EmployeeNumber = EmployeeNumber::new(101);
pub const DEMO_USERNAME: &str = "johndoe1234";
pub const DEMO_PASSWORD: &str = "Password123!";

/// Seed one admin employee and one review. Running it again changes nothing.
pub async fn populate_demo_data(
    employees: &dyn EmployeeStore,
    reviews: &dyn ReviewStore,
) -> StoreResult<()> {
    if employees.find_by_number(DEMO_EMPLOYEE_NUMBER).await?.is_none() {
        let password_hash =
            hash_password(DEMO_PASSWORD).map_err(|e| StoreError::Backend(e.to_string()))?;
        employees
            .insert(NewEmployee {
                employee_number: DEMO_EMPLOYEE_NUMBER,
                name: "John Doe".to_string(),
                username: DEMO_USERNAME.to_string(),
                email: "john.doe@example.com".to_string(),
                password_hash,
                is_admin: true,
            })
            .await?;
        tracing::info!(employee_number = %DEMO_EMPLOYEE_NUMBER, "demo employee seeded");
    }

    if reviews
        .list_for_employee(DEMO_EMPLOYEE_NUMBER)
        .await?
        .is_empty()
    {
        let review_date = NaiveDate::from_ymd_opt(2024, 9, 4)
            .ok_or_else(|| StoreError::Backend("invalid demo review date".to_string()))?;
        reviews
            .create(NewReview::new(
                DEMO_EMPLOYEE_NUMBER,
                ReviewDraft {
                    review_date,
                    reviewer_id: 202,
                    overall_performance_rating: Rating::Excellent,
                    goals: "My main goal is to take part in leadership opportunities in the next term."
                        .to_string(),
                    reviewer_comments: "John has shown great progress in his career goals."
                        .to_string(),
                },
            ))
            .await?;
        tracing::info!("demo review seeded");
    }

    Ok(())
}
