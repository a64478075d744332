//! User routes
//!
//! Profile CRUD plus the provider-statistics aggregation endpoint.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use bson::{doc, oid::ObjectId};
use futures::TryStreamExt;
use std::sync::Arc;

use crate::api::{Created, MessageResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::stats::{compute_provider_stats, ProviderStats};
use crate::domain::user::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::domain::{Booking, Service};
use crate::error::{ApiError, ApiResult};
use crate::routes::parse_object_id;

/// GET /api/users
pub async fn list_users(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users: Vec<_> = state
        .db
        .users()
        .find(doc! {}, None)
        .await?
        .try_collect()
        .await?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// GET /api/users/:id
pub async fn get_user(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let oid = parse_object_id(&id, "user")?;
    let user = state
        .db
        .users()
        .find_one(doc! { "_id": oid }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user.into()))
}

/// POST /api/users
///
/// First registration; public because it happens right after sign-up with
/// the identity provider, before the profile exists.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate().map_err(ApiError::bad_request)?;

    let email = req.email.trim().to_lowercase();
    let existing = state
        .db
        .users()
        .find_one(
            doc! { "$or": [
                { "email": &email },
                { "externalUid": &req.external_uid },
            ]},
            None,
        )
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("User already exists"));
    }

    tracing::info!(external_uid = %req.external_uid, "Registering user");

    let mut user = req.into_user(chrono::Utc::now());
    let result = state.db.users().insert_one(&user, None).await?;
    user.id = result.inserted_id.as_object_id();

    Ok(Created(UserResponse::from(user)))
}

/// PUT /api/users/:id
pub async fn update_user(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let oid = parse_object_id(&id, "user")?;

    let mut set = doc! { "updatedAt": bson::DateTime::now() };
    if let Some(display_name) = req.display_name {
        set.insert("displayName", display_name);
    }
    if let Some(photo_url) = req.photo_url {
        set.insert("photoUrl", photo_url);
    }
    if let Some(role) = req.role {
        set.insert(
            "role",
            bson::to_bson(&role).map_err(|e| ApiError::Internal(e.into()))?,
        );
    }
    if let Some(phone) = req.phone {
        set.insert("phone", phone);
    }
    if let Some(address) = req.address {
        set.insert(
            "address",
            bson::to_bson(&address).map_err(|e| ApiError::Internal(e.into()))?,
        );
    }
    if let Some(is_verified) = req.is_verified {
        set.insert("isVerified", is_verified);
    }
    if let Some(is_active) = req.is_active {
        set.insert("isActive", is_active);
    }
    if let Some(preferences) = req.preferences {
        set.insert(
            "preferences",
            bson::to_bson(&preferences).map_err(|e| ApiError::Internal(e.into()))?,
        );
    }

    tracing::info!(uid = %auth.uid, user_id = %id, "Updating user");

    let updated = state
        .db
        .users()
        .find_one_and_update(
            doc! { "_id": oid },
            doc! { "$set": set },
            mongodb::options::FindOneAndUpdateOptions::builder()
                .return_document(mongodb::options::ReturnDocument::After)
                .build(),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(updated.into()))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    let oid = parse_object_id(&id, "user")?;

    tracing::info!(uid = %auth.uid, user_id = %id, "Deleting user");

    let result = state.db.users().delete_one(doc! { "_id": oid }, None).await?;
    if result.deleted_count == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(MessageResponse::new("User deleted successfully"))
}

/// GET /api/users/:userId/provider-stats
///
/// Joins the provider's services with every booking referencing them and
/// derives the dashboard snapshot. Recomputed in full on every request; no
/// caching, no pagination on the underlying join.
pub async fn provider_stats(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ProviderStats>> {
    let services: Vec<Service> = state
        .db
        .services()
        .find(doc! { "provider.userId": &user_id }, None)
        .await?
        .try_collect()
        .await?;

    let service_ids: Vec<ObjectId> = services.iter().filter_map(|s| s.id).collect();
    let bookings: Vec<Booking> = state
        .db
        .bookings()
        .find(doc! { "service": { "$in": service_ids } }, None)
        .await?
        .try_collect()
        .await?;

    let stats = compute_provider_stats(&services, &bookings, chrono::Utc::now());
    Ok(Json(stats))
}
