//! Booking routes
//!
//! Creation snapshots price and provider identity from the service; the
//! status endpoint enforces the lifecycle transition table; cancellation is
//! its own operation carrying reason metadata.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use bson::doc;
use futures::TryStreamExt;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::Created;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::booking::{
    BookingResponse, BookingStatus, CancelBookingRequest, CreateBookingRequest,
    UpdateStatusRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::routes::parse_object_id;

/// POST /api/bookings
pub async fn create_booking(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate().map_err(ApiError::bad_request)?;
    let service_id = parse_object_id(&req.service, "service")?;

    let service = state
        .db
        .services()
        .find_one(doc! { "_id": service_id }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;

    if !service.available {
        return Err(ApiError::bad_request("Service is not available for booking"));
    }

    tracing::info!(
        uid = %auth.uid,
        service_id = %req.service,
        "Creating booking"
    );

    let mut booking = req.into_booking(&service, chrono::Utc::now());
    let result = state.db.bookings().insert_one(&booking, None).await?;
    booking.id = result.inserted_id.as_object_id();

    // Bump the service's booking counter. Not transactional with the insert;
    // the counter is advisory (statistics recount from bookings directly).
    state
        .db
        .services()
        .update_one(
            doc! { "_id": service_id },
            doc! { "$inc": { "bookingCount": 1 } },
            None,
        )
        .await?;

    Ok(Created(BookingResponse::from(booking)))
}

/// GET /api/bookings
pub async fn list_bookings(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
    let bookings: Vec<_> = state
        .db
        .bookings()
        .find(doc! {}, options)
        .await?
        .try_collect()
        .await?;

    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

/// GET /api/bookings/:id
pub async fn get_booking(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<BookingResponse>> {
    let oid = parse_object_id(&id, "booking")?;
    let booking = state
        .db
        .bookings()
        .find_one(doc! { "_id": oid }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    Ok(Json(booking.into()))
}

/// PUT /api/bookings/:id/status
///
/// Transition a booking along the lifecycle. The target must be a legal
/// successor of the current status; illegal jumps are rejected with a typed
/// error instead of being persisted. The check-then-write is last-write-wins
/// under concurrency.
pub async fn update_booking_status(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<BookingResponse>> {
    let oid = parse_object_id(&id, "booking")?;

    let booking = state
        .db
        .bookings()
        .find_one(doc! { "_id": oid }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    if !booking.status.can_transition_to(req.status) {
        return Err(ApiError::InvalidTransition {
            from: booking.status.to_string(),
            to: req.status.to_string(),
        });
    }

    tracing::info!(
        uid = %auth.uid,
        booking_id = %id,
        from = %booking.status,
        to = %req.status,
        "Updating booking status"
    );

    let updated = state
        .db
        .bookings()
        .find_one_and_update(
            doc! { "_id": oid },
            doc! { "$set": {
                "status": req.status.to_string(),
                "updatedAt": bson::DateTime::now(),
            }},
            FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build(),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    Ok(Json(updated.into()))
}

/// PUT /api/bookings/:id/cancel
///
/// Cancel a booking, recording who cancelled, why, and when. Only legal from
/// non-terminal states.
pub async fn cancel_booking(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CancelBookingRequest>,
) -> ApiResult<Json<BookingResponse>> {
    let oid = parse_object_id(&id, "booking")?;

    let booking = state
        .db
        .bookings()
        .find_one(doc! { "_id": oid }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    if booking.status.is_terminal() {
        return Err(ApiError::InvalidTransition {
            from: booking.status.to_string(),
            to: BookingStatus::Cancelled.to_string(),
        });
    }

    tracing::info!(uid = %auth.uid, booking_id = %id, "Cancelling booking");

    let mut set = doc! {
        "status": BookingStatus::Cancelled.to_string(),
        "cancelledAt": bson::DateTime::now(),
        "updatedAt": bson::DateTime::now(),
    };
    if let Some(reason) = req.reason {
        set.insert("cancellationReason", reason);
    }
    if let Some(cancelled_by) = req.cancelled_by {
        set.insert("cancelledBy", cancelled_by);
    }

    let updated = state
        .db
        .bookings()
        .find_one_and_update(
            doc! { "_id": oid },
            doc! { "$set": set },
            FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build(),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    Ok(Json(updated.into()))
}

#[derive(Debug, Deserialize)]
pub struct StatusFilterQuery {
    #[serde(default)]
    pub status: Option<BookingStatus>,
}

async fn bookings_for(
    state: &AppState,
    key: &str,
    user_id: String,
    status: Option<BookingStatus>,
) -> ApiResult<Vec<BookingResponse>> {
    let mut filter = doc! { key: user_id };
    if let Some(status) = status {
        filter.insert("status", status.to_string());
    }

    let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
    let bookings: Vec<_> = state
        .db
        .bookings()
        .find(filter, options)
        .await?
        .try_collect()
        .await?;

    Ok(bookings.into_iter().map(Into::into).collect())
}

/// GET /api/bookings/user/:userId
pub async fn user_bookings(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<StatusFilterQuery>,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    let bookings = bookings_for(&state, "customer.userId", user_id, query.status).await?;
    Ok(Json(bookings))
}

/// GET /api/bookings/provider/:userId
pub async fn provider_bookings(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<StatusFilterQuery>,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    let bookings = bookings_for(&state, "provider.userId", user_id, query.status).await?;
    Ok(Json(bookings))
}
