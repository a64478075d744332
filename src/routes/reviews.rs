//! Review routes
//!
//! Reviews live embedded in their service document; the service aggregate is
//! the single source of truth. Every endpoint here (and the service-scoped
//! submission endpoint) funnels through the same append/recompute path, so
//! the per-booking uniqueness check and the rating summary can never drift.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use bson::{doc, oid::ObjectId};
use chrono::Utc;
use futures::TryStreamExt;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::{Created, MessageResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::db::MongoDb;
use crate::domain::service::{
    AddReviewRequest, RatingSummary, Review, ReviewDto, ReviewerInfo, Service,
};
use crate::error::{ApiError, ApiResult};
use crate::routes::parse_object_id;

/// The one write path for new reviews: duplicate check against the embedded
/// list, append, and rating recomputation, persisted in a single update.
///
/// Reads and writes are not transactional; two concurrent submissions can
/// interleave (last-write-wins on the summary). Accepted at this scale.
pub(crate) async fn append_review(
    db: &MongoDb,
    service_id: ObjectId,
    req: AddReviewRequest,
) -> ApiResult<ReviewDto> {
    req.validate().map_err(ApiError::bad_request)?;
    let booking = parse_object_id(&req.booking, "booking")?;

    let service = db
        .services()
        .find_one(doc! { "_id": service_id }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;

    if service.has_review_for_booking(&booking) {
        return Err(ApiError::DuplicateReview(booking.to_hex()));
    }

    let review = Review {
        id: ObjectId::new(),
        booking,
        customer: req.customer,
        rating: req.rating,
        comment: req.comment,
        response: None,
        created_at: Utc::now(),
    };

    let mut reviews = service.reviews.clone();
    reviews.push(review.clone());
    let rating = RatingSummary::from_reviews(&reviews);

    let review_bson = bson::to_bson(&review).map_err(|e| ApiError::Internal(e.into()))?;
    db.services()
        .update_one(
            doc! { "_id": service_id },
            doc! {
                "$push": { "reviews": review_bson },
                "$set": {
                    "rating.average": rating.average,
                    "rating.count": rating.count,
                    "updatedAt": bson::DateTime::now(),
                },
            },
            None,
        )
        .await?;

    Ok(ReviewDto::from_embedded(&service_id, &review))
}

/// Persist a mutated embedded review list and its recomputed summary
async fn store_reviews(db: &MongoDb, service_id: ObjectId, reviews: &[Review]) -> ApiResult<()> {
    let rating = RatingSummary::from_reviews(reviews);
    let reviews_bson = bson::to_bson(reviews).map_err(|e| ApiError::Internal(e.into()))?;
    db.services()
        .update_one(
            doc! { "_id": service_id },
            doc! {
                "$set": {
                    "reviews": reviews_bson,
                    "rating.average": rating.average,
                    "rating.count": rating.count,
                    "updatedAt": bson::DateTime::now(),
                },
            },
            None,
        )
        .await?;
    Ok(())
}

/// Find the service owning a review, by review id
async fn find_owning_service(db: &MongoDb, review_id: ObjectId) -> ApiResult<Service> {
    db.services()
        .find_one(doc! { "reviews._id": review_id }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Review not found"))
}

/// GET /api/reviews
///
/// All reviews across services, newest first.
pub async fn list_reviews(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<ReviewDto>>> {
    let services: Vec<Service> = state
        .db
        .services()
        .find(doc! { "reviews.0": { "$exists": true } }, None)
        .await?
        .try_collect()
        .await?;

    let mut reviews: Vec<ReviewDto> = services
        .iter()
        .flat_map(|s| {
            let id = s.id.unwrap_or_default();
            s.reviews
                .iter()
                .map(move |r| ReviewDto::from_embedded(&id, r))
        })
        .collect();
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(reviews))
}

/// GET /api/reviews/:id
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReviewDto>> {
    let oid = parse_object_id(&id, "review")?;
    let service = find_owning_service(&state.db, oid).await?;
    let service_id = service.id.unwrap_or_default();

    let review = service
        .reviews
        .iter()
        .find(|r| r.id == oid)
        .ok_or_else(|| ApiError::not_found("Review not found"))?;

    Ok(Json(ReviewDto::from_embedded(&service_id, review)))
}

/// Request body for the standalone creation endpoint; carries the service id
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub service: String,
    pub booking: String,
    pub customer: ReviewerInfo,
    pub rating: i32,
    pub comment: String,
}

/// POST /api/reviews
pub async fn create_review(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    let service_id = parse_object_id(&req.service, "service")?;

    tracing::info!(uid = %auth.uid, service_id = %req.service, "Creating review");

    let review = append_review(
        &state.db,
        service_id,
        AddReviewRequest {
            booking: req.booking,
            customer: req.customer,
            rating: req.rating,
            comment: req.comment,
        },
    )
    .await?;

    Ok(Created(review))
}

/// Request body for editing a review
#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// PUT /api/reviews/:id
pub async fn update_review(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateReviewRequest>,
) -> ApiResult<Json<ReviewDto>> {
    let oid = parse_object_id(&id, "review")?;

    if let Some(rating) = req.rating {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::bad_request("Rating must be between 1 and 5"));
        }
    }
    if let Some(comment) = &req.comment {
        if comment.is_empty() || comment.len() > 500 {
            return Err(ApiError::bad_request(
                "Comment must be between 1 and 500 characters",
            ));
        }
    }

    tracing::info!(uid = %auth.uid, review_id = %id, "Updating review");

    let service = find_owning_service(&state.db, oid).await?;
    let service_id = service.id.unwrap_or_default();

    let mut reviews = service.reviews;
    let review = reviews
        .iter_mut()
        .find(|r| r.id == oid)
        .ok_or_else(|| ApiError::not_found("Review not found"))?;
    if let Some(rating) = req.rating {
        review.rating = rating;
    }
    if let Some(comment) = req.comment {
        review.comment = comment;
    }
    let updated = review.clone();

    store_reviews(&state.db, service_id, &reviews).await?;

    Ok(Json(ReviewDto::from_embedded(&service_id, &updated)))
}

/// DELETE /api/reviews/:id
pub async fn delete_review(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    let oid = parse_object_id(&id, "review")?;

    tracing::info!(uid = %auth.uid, review_id = %id, "Deleting review");

    let service = find_owning_service(&state.db, oid).await?;
    let service_id = service.id.unwrap_or_default();

    let mut reviews = service.reviews;
    let before = reviews.len();
    reviews.retain(|r| r.id != oid);
    if reviews.len() == before {
        return Err(ApiError::not_found("Review not found"));
    }

    store_reviews(&state.db, service_id, &reviews).await?;

    Ok(MessageResponse::new("Review deleted successfully"))
}

/// GET /api/reviews/service/:serviceId
///
/// A service's reviews, newest first.
pub async fn service_reviews(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<String>,
) -> ApiResult<Json<Vec<ReviewDto>>> {
    let oid = parse_object_id(&service_id, "service")?;
    let service = state
        .db
        .services()
        .find_one(doc! { "_id": oid }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;

    let mut reviews: Vec<ReviewDto> = service
        .reviews
        .iter()
        .map(|r| ReviewDto::from_embedded(&oid, r))
        .collect();
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(reviews))
}
