//! Review use-cases: every read and write passes through the access policy
//! before touching the store.

use std::sync::Arc;

use epm_auth::{Identity, ReviewAction, authorize, authorize_create};
use epm_core::ReviewId;
use epm_reviews::{NewReview, Review, ReviewRequest};

use crate::error::{ServiceError, ServiceResult};
use crate::store::ReviewStore;

#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewStore>,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewStore>) -> Self {
        Self { reviews }
    }

    /// Reviews for the home view.
    ///
    /// Only an admin who asked for everything gets every review; all other
    /// combinations list the identity's own reviews.
    pub async fn visible_reviews(
        &self,
        identity: &Identity,
        all_requested: bool,
    ) -> ServiceResult<Vec<Review>> {
        if all_requested && identity.is_admin() {
            return self.list_all(identity).await;
        }
        Ok(self
            .reviews
            .list_for_employee(identity.employee_number())
            .await?)
    }

    pub async fn list_all(&self, identity: &Identity) -> ServiceResult<Vec<Review>> {
        if !identity.is_admin() {
            return Err(ServiceError::Forbidden(ReviewAction::Read));
        }
        Ok(self.reviews.list_all().await?)
    }

    pub async fn get(&self, identity: &Identity, id: ReviewId) -> ServiceResult<Review> {
        let review = self.load(id).await?;
        authorize(identity, ReviewAction::Read, &review)?;
        Ok(review)
    }

    /// Like [`get`](Self::get) but checks the edit permission, for
    /// pre-populating the edit form.
    pub async fn get_for_edit(&self, identity: &Identity, id: ReviewId) -> ServiceResult<Review> {
        let review = self.load(id).await?;
        authorize(identity, ReviewAction::Edit, &review)?;
        Ok(review)
    }

    /// Create a review whose subject is always the acting identity.
    pub async fn create(&self, identity: &Identity, request: ReviewRequest) -> ServiceResult<Review> {
        authorize_create(identity)?;
        let draft = request.validate()?;

        let review = self
            .reviews
            .create(NewReview::new(identity.employee_number(), draft))
            .await?;
        tracing::info!(
            review_id = %review.review_id,
            employee_number = %review.employee_number,
            "review created"
        );
        Ok(review)
    }

    pub async fn update(
        &self,
        identity: &Identity,
        id: ReviewId,
        request: ReviewRequest,
    ) -> ServiceResult<Review> {
        let existing = self.load(id).await?;
        authorize(identity, ReviewAction::Edit, &existing)?;
        let draft = request.validate()?;

        let review = self
            .reviews
            .update(id, draft)
            .await?
            .ok_or(ServiceError::NotFound)?;
        tracing::info!(review_id = %id, actor = %identity, "review updated");
        Ok(review)
    }

    pub async fn delete(&self, identity: &Identity, id: ReviewId) -> ServiceResult<()> {
        let existing = self.load(id).await?;
        authorize(identity, ReviewAction::Delete, &existing)?;

        if !self.reviews.delete(id).await? {
            return Err(ServiceError::NotFound);
        }
        tracing::info!(review_id = %id, actor = %identity, "review deleted");
        Ok(())
    }

    async fn load(&self, id: ReviewId) -> ServiceResult<Review> {
        self.reviews
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }
}
