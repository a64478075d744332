//! Service routes
//!
//! Public browsing (listing, search, top-rated, detail) plus authenticated
//! listing management and the review-submission endpoint.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use bson::doc;
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::{Created, MessageResponse, PaginationParams};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::service::{
    AddReviewRequest, CreateServiceRequest, ServiceResponse, UpdateServiceRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::routes::parse_object_id;
use crate::routes::reviews::append_review;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListResponse {
    pub services: Vec<ServiceResponse>,
    pub total_pages: u64,
    pub current_page: u32,
    pub total: u64,
}

/// GET /api/services
///
/// Public paginated listing of available services.
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ServiceListQuery>,
) -> ApiResult<Json<ServiceListResponse>> {
    let mut filter = doc! { "available": true };

    if let Some(category) = &query.category {
        if category != "all" {
            filter.insert("category", category.to_lowercase());
        }
    }
    if let Some(search) = &query.search {
        if !search.is_empty() {
            filter.insert("$text", doc! { "$search": search });
        }
    }
    let mut price = doc! {};
    if let Some(min) = query.min_price {
        price.insert("$gte", min);
    }
    if let Some(max) = query.max_price {
        price.insert("$lte", max);
    }
    if !price.is_empty() {
        filter.insert("price", price);
    }

    let pagination = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    let options = FindOptions::builder()
        .sort(doc! { "createdAt": -1 })
        .skip(pagination.skip())
        .limit(i64::from(pagination.limit()))
        .build();

    let services: Vec<_> = state
        .db
        .services()
        .find(filter.clone(), options)
        .await?
        .try_collect()
        .await?;
    let total = state.db.services().count_documents(filter, None).await?;

    Ok(Json(ServiceListResponse {
        services: services.into_iter().map(Into::into).collect(),
        total_pages: pagination.total_pages(total),
        current_page: pagination.page(),
        total,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TopRatedQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

/// GET /api/services/top-rated
///
/// Public; the highest-rated available services.
pub async fn top_rated_services(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TopRatedQuery>,
) -> ApiResult<Json<Vec<ServiceResponse>>> {
    let limit = query.limit.unwrap_or(6).clamp(1, 50);
    let options = FindOptions::builder()
        .sort(doc! { "rating.average": -1, "rating.count": -1 })
        .limit(limit)
        .build();

    let services: Vec<_> = state
        .db
        .services()
        .find(doc! { "available": true }, options)
        .await?
        .try_collect()
        .await?;

    Ok(Json(services.into_iter().map(Into::into).collect()))
}

/// GET /api/services/:id
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ServiceResponse>> {
    let oid = parse_object_id(&id, "service")?;
    let service = state
        .db
        .services()
        .find_one(doc! { "_id": oid }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;

    Ok(Json(service.into()))
}

/// POST /api/services
pub async fn create_service(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateServiceRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate().map_err(ApiError::bad_request)?;

    tracing::info!(
        uid = %auth.uid,
        name = %req.name,
        category = %req.category,
        "Creating service"
    );

    let mut service = req.into_service(chrono::Utc::now());
    let result = state.db.services().insert_one(&service, None).await?;
    service.id = result.inserted_id.as_object_id();

    Ok(Created(ServiceResponse::from(service)))
}

/// PUT /api/services/:id
pub async fn update_service(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateServiceRequest>,
) -> ApiResult<Json<ServiceResponse>> {
    let oid = parse_object_id(&id, "service")?;
    req.validate().map_err(ApiError::bad_request)?;

    let mut set = doc! { "updatedAt": bson::DateTime::now() };
    if let Some(name) = req.name {
        set.insert("name", name.trim());
    }
    if let Some(category) = req.category {
        set.insert("category", category.to_string());
    }
    if let Some(description) = req.description {
        set.insert("description", description);
    }
    if let Some(price) = req.price {
        set.insert("price", price);
    }
    if let Some(image) = req.image {
        set.insert("image", image);
    }
    if let Some(available) = req.available {
        set.insert("available", available);
    }

    tracing::info!(uid = %auth.uid, service_id = %id, "Updating service");

    let updated = state
        .db
        .services()
        .find_one_and_update(
            doc! { "_id": oid },
            doc! { "$set": set },
            mongodb::options::FindOneAndUpdateOptions::builder()
                .return_document(mongodb::options::ReturnDocument::After)
                .build(),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;

    Ok(Json(updated.into()))
}

/// DELETE /api/services/:id
pub async fn delete_service(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    let oid = parse_object_id(&id, "service")?;

    tracing::info!(uid = %auth.uid, service_id = %id, "Deleting service");

    let result = state
        .db
        .services()
        .delete_one(doc! { "_id": oid }, None)
        .await?;

    if result.deleted_count == 0 {
        return Err(ApiError::not_found("Service not found"));
    }

    Ok(MessageResponse::new("Service deleted successfully"))
}

/// GET /api/services/user/:userId
///
/// A provider's own listings, newest first.
pub async fn my_services(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<ServiceResponse>>> {
    let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
    let services: Vec<_> = state
        .db
        .services()
        .find(doc! { "provider.userId": user_id }, options)
        .await?
        .try_collect()
        .await?;

    Ok(Json(services.into_iter().map(Into::into).collect()))
}

/// POST /api/services/:id/review
///
/// Append a review to the service's embedded list; same code path as the
/// standalone review endpoint.
pub async fn add_service_review(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AddReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    let oid = parse_object_id(&id, "service")?;

    tracing::info!(uid = %auth.uid, service_id = %id, "Adding review");

    let review = append_review(&state.db, oid, req).await?;
    Ok(Created(review))
}
