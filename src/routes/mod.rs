pub mod bookings;
pub mod health;
pub mod reviews;
pub mod services;
pub mod users;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use bson::oid::ObjectId;
use std::sync::Arc;

use crate::app::AppState;
use crate::error::ApiError;

/// Parse a hex ObjectId path/body parameter
pub(crate) fn parse_object_id(id: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::bad_request(format!("Invalid {what} id")))
}

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Health
        .route("/", get(health::root))
        .route("/api/health", get(health::health_check))
        // Services
        .route("/api/services", get(services::list_services))
        .route("/api/services", post(services::create_service))
        .route("/api/services/top-rated", get(services::top_rated_services))
        .route("/api/services/user/:user_id", get(services::my_services))
        .route("/api/services/:id", get(services::get_service))
        .route("/api/services/:id", put(services::update_service))
        .route("/api/services/:id", delete(services::delete_service))
        .route("/api/services/:id/review", post(services::add_service_review))
        // Bookings
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings", get(bookings::list_bookings))
        .route("/api/bookings/user/:user_id", get(bookings::user_bookings))
        .route(
            "/api/bookings/provider/:user_id",
            get(bookings::provider_bookings),
        )
        .route("/api/bookings/:id", get(bookings::get_booking))
        .route(
            "/api/bookings/:id/status",
            put(bookings::update_booking_status),
        )
        .route("/api/bookings/:id/cancel", put(bookings::cancel_booking))
        // Reviews
        .route("/api/reviews", get(reviews::list_reviews))
        .route("/api/reviews", post(reviews::create_review))
        .route(
            "/api/reviews/service/:service_id",
            get(reviews::service_reviews),
        )
        .route("/api/reviews/:id", get(reviews::get_review))
        .route("/api/reviews/:id", put(reviews::update_review))
        .route("/api/reviews/:id", delete(reviews::delete_review))
        // Users
        .route("/api/users", get(users::list_users))
        .route("/api/users", post(users::create_user))
        .route("/api/users/:id", get(users::get_user))
        .route("/api/users/:id", put(users::update_user))
        .route("/api/users/:id", delete(users::delete_user))
        .route(
            "/api/users/:user_id/provider-stats",
            get(users::provider_stats),
        )
}
