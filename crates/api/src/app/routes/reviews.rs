use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use epm_auth::{Identity, Notice};
use epm_core::ReviewId;
use epm_infra::ServiceError;
use epm_reviews::ReviewRequest;

use crate::app::dto::{HomeView, ReviewFormView};
use crate::app::errors::service_error_to_response;
use crate::app::routes::{redirect_with_notice, take_notices};
use crate::app::services::AppServices;
use crate::context::SessionContext;

/// A malformed id names no review.
fn parse_review_id(raw: &str) -> Result<ReviewId, Response> {
    raw.parse::<ReviewId>()
        .map_err(|_| service_error_to_response(ServiceError::NotFound))
}

pub async fn home(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let all_requested = params.contains_key("all_reviews");

    match services.reviews.visible_reviews(&identity, all_requested).await {
        Ok(reviews) => Json(HomeView {
            view: "home",
            identity,
            all_reviews: all_requested && identity.is_admin(),
            reviews,
            notices: take_notices(&services, &ctx),
        })
        .into_response(),
        Err(err) => service_error_to_response(err),
    }
}

pub async fn create_review_page(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    Json(ReviewFormView::create(take_notices(&services, &ctx))).into_response()
}

pub async fn create_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Extension(identity): Extension<Identity>,
    Form(req): Form<ReviewRequest>,
) -> Response {
    let submitted = req.clone();
    match services.reviews.create(&identity, req).await {
        Ok(_review) => redirect_with_notice(
            &services,
            &ctx,
            Notice::success("Your review has been successfully added."),
            "/home",
        ),
        Err(ServiceError::Validation(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ReviewFormView::create(take_notices(&services, &ctx)).rejected(submitted, errors)),
        )
            .into_response(),
        Err(ServiceError::Persistence) => redirect_with_notice(
            &services,
            &ctx,
            Notice::danger("An error occurred while creating the review. Please try again."),
            "/create-review",
        ),
        Err(err) => service_error_to_response(err),
    }
}

pub async fn edit_review_page(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Extension(identity): Extension<Identity>,
    Path(review_id): Path<String>,
) -> Response {
    let id = match parse_review_id(&review_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.reviews.get_for_edit(&identity, id).await {
        Ok(review) => {
            Json(ReviewFormView::edit(&review, take_notices(&services, &ctx))).into_response()
        }
        Err(ServiceError::Forbidden(_)) => redirect_with_notice(
            &services,
            &ctx,
            Notice::danger("You do not have permission to edit this review."),
            "/home",
        ),
        Err(err) => service_error_to_response(err),
    }
}

pub async fn edit_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Extension(identity): Extension<Identity>,
    Path(review_id): Path<String>,
    Form(req): Form<ReviewRequest>,
) -> Response {
    let id = match parse_review_id(&review_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let submitted = req.clone();
    match services.reviews.update(&identity, id, req).await {
        Ok(_review) => redirect_with_notice(
            &services,
            &ctx,
            Notice::success("Review updated successfully."),
            "/home",
        ),
        Err(ServiceError::Forbidden(_)) => redirect_with_notice(
            &services,
            &ctx,
            Notice::danger("You do not have permission to edit this review."),
            "/home",
        ),
        Err(ServiceError::Validation(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ReviewFormView::rejected_edit(
                id,
                submitted,
                take_notices(&services, &ctx),
                errors,
            )),
        )
            .into_response(),
        Err(ServiceError::Persistence) => redirect_with_notice(
            &services,
            &ctx,
            Notice::danger("An error occurred while updating the review. Please try again."),
            &format!("/edit-review/{id}"),
        ),
        Err(err) => service_error_to_response(err),
    }
}

pub async fn delete_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Extension(identity): Extension<Identity>,
    Path(review_id): Path<String>,
) -> Response {
    let id = match parse_review_id(&review_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let notice = match services.reviews.delete(&identity, id).await {
        Ok(()) => Notice::success("Review deleted successfully."),
        Err(ServiceError::Forbidden(_)) => {
            Notice::danger("You do not have permission to delete this review.")
        }
        Err(ServiceError::Persistence) => {
            Notice::danger("An error occurred while deleting the review. Please try again.")
        }
        Err(err) => return service_error_to_response(err),
    };
    redirect_with_notice(&services, &ctx, notice, "/home")
}
