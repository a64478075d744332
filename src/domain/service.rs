//! Service listings and their embedded reviews
//!
//! A service is the aggregate root for its reviews: the embedded `reviews`
//! array is the single authoritative representation, and `rating` is always
//! recomputed from it in one code path. At most one review may reference a
//! given booking.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed set of service categories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Plumbing,
    Electrical,
    Cleaning,
    Carpentry,
    Hvac,
    Painting,
    Other,
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Plumbing => "plumbing",
            Self::Electrical => "electrical",
            Self::Cleaning => "cleaning",
            Self::Carpentry => "carpentry",
            Self::Hvac => "hvac",
            Self::Painting => "painting",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Provider identity embedded in a service document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub verified: bool,
}

/// Aggregated rating summary kept on the service document
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
}

impl RatingSummary {
    /// Recompute the summary from the authoritative review set.
    /// An empty set resets both fields to zero.
    pub fn from_reviews(reviews: &[Review]) -> Self {
        if reviews.is_empty() {
            return Self::default();
        }
        let total: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
        Self {
            average: total as f64 / reviews.len() as f64,
            count: reviews.len() as i64,
        }
    }
}

/// Reviewer identity embedded in a review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerInfo {
    pub user_id: String,
    pub name: String,
}

/// Provider response attached to a review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReply {
    pub text: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Review embedded in a service document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// The booking this review is for; unique within the service
    pub booking: ObjectId,
    pub customer: ReviewerInfo,
    /// 1-5 stars
    pub rating: i32,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ReviewReply>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

fn default_image() -> String {
    "https://via.placeholder.com/400x300".to_string()
}

fn default_true() -> bool {
    true
}

/// Service document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub category: ServiceCategory,
    pub description: String,
    /// Hourly price, non-negative
    pub price: f64,
    #[serde(default = "default_image")]
    pub image: String,
    pub provider: ProviderInfo,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub rating: RatingSummary,
    #[serde(default)]
    pub booking_count: i64,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Whether any embedded review already references the booking
    pub fn has_review_for_booking(&self, booking: &ObjectId) -> bool {
        self.reviews.iter().any(|r| &r.booking == booking)
    }
}

/// Request body for creating a service
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub name: String,
    pub category: ServiceCategory,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub image: Option<String>,
    pub provider: ProviderInfo,
    #[serde(default)]
    pub available: Option<bool>,
}

impl CreateServiceRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Service name is required".to_string());
        }
        if self.description.is_empty() {
            return Err("Description is required".to_string());
        }
        if self.description.len() > 1000 {
            return Err("Description cannot exceed 1000 characters".to_string());
        }
        if self.price < 0.0 || !self.price.is_finite() {
            return Err("Price cannot be negative".to_string());
        }
        Ok(())
    }

    pub fn into_service(self, now: DateTime<Utc>) -> Service {
        Service {
            id: None,
            name: self.name.trim().to_string(),
            category: self.category,
            description: self.description,
            price: self.price,
            image: self.image.unwrap_or_else(default_image),
            provider: self.provider,
            available: self.available.unwrap_or(true),
            rating: RatingSummary::default(),
            booking_count: 0,
            reviews: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request body for updating a service; all fields optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<ServiceCategory>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub available: Option<bool>,
}

impl UpdateServiceRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("Service name cannot be empty".to_string());
            }
        }
        if let Some(description) = &self.description {
            if description.len() > 1000 {
                return Err("Description cannot exceed 1000 characters".to_string());
            }
        }
        if let Some(price) = self.price {
            if price < 0.0 || !price.is_finite() {
                return Err("Price cannot be negative".to_string());
            }
        }
        Ok(())
    }
}

/// Request body for submitting a review
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReviewRequest {
    /// Booking the review is about (hex ObjectId)
    pub booking: String,
    pub customer: ReviewerInfo,
    pub rating: i32,
    pub comment: String,
}

impl AddReviewRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=5).contains(&self.rating) {
            return Err("Rating must be between 1 and 5".to_string());
        }
        if self.comment.is_empty() {
            return Err("Comment is required".to_string());
        }
        if self.comment.len() > 500 {
            return Err("Comment cannot exceed 500 characters".to_string());
        }
        Ok(())
    }
}

/// Review as returned over the wire
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: String,
    /// Owning service (hex id), resolved when flattening across services
    pub service: String,
    pub booking: String,
    pub customer: ReviewerInfo,
    pub rating: i32,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ReviewReplyDto>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReplyDto {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ReviewDto {
    pub fn from_embedded(service_id: &ObjectId, review: &Review) -> Self {
        Self {
            id: review.id.to_hex(),
            service: service_id.to_hex(),
            booking: review.booking.to_hex(),
            customer: review.customer.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            response: review.response.as_ref().map(|r| ReviewReplyDto {
                text: r.text.clone(),
                created_at: r.created_at,
            }),
            created_at: review.created_at,
        }
    }
}

/// Service as returned over the wire
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub id: String,
    pub name: String,
    pub category: ServiceCategory,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub provider: ProviderInfo,
    pub available: bool,
    pub rating: RatingSummary,
    pub booking_count: i64,
    pub reviews: Vec<ReviewDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Service> for ServiceResponse {
    fn from(s: Service) -> Self {
        let id = s.id.unwrap_or_default();
        Self {
            reviews: s
                .reviews
                .iter()
                .map(|r| ReviewDto::from_embedded(&id, r))
                .collect(),
            id: id.to_hex(),
            name: s.name,
            category: s.category,
            description: s.description,
            price: s.price,
            image: s.image,
            provider: s.provider,
            available: s.available,
            rating: s.rating,
            booking_count: s.booking_count,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(booking: ObjectId, rating: i32) -> Review {
        Review {
            id: ObjectId::new(),
            booking,
            customer: ReviewerInfo {
                user_id: "uid-1".to_string(),
                name: "Ada".to_string(),
            },
            rating,
            comment: "fine work".to_string(),
            response: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn rating_resets_to_zero_when_no_reviews() {
        let summary = RatingSummary::from_reviews(&[]);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.count, 0);
    }

    #[test]
    fn rating_is_the_arithmetic_mean() {
        let reviews = vec![
            review(ObjectId::new(), 5),
            review(ObjectId::new(), 4),
            review(ObjectId::new(), 3),
        ];
        let summary = RatingSummary::from_reviews(&reviews);
        assert_eq!(summary.average, 4.0);
        assert_eq!(summary.count, 3);
    }

    #[test]
    fn duplicate_booking_is_detected() {
        let booking = ObjectId::new();
        let now = Utc::now();
        let service = Service {
            id: Some(ObjectId::new()),
            name: "Pipe fixing".to_string(),
            category: ServiceCategory::Plumbing,
            description: "desc".to_string(),
            price: 50.0,
            image: default_image(),
            provider: ProviderInfo {
                user_id: "p1".to_string(),
                name: "Bob".to_string(),
                email: "bob@example.com".to_string(),
                verified: true,
            },
            available: true,
            rating: RatingSummary::default(),
            booking_count: 0,
            reviews: vec![review(booking, 5)],
            created_at: now,
            updated_at: now,
        };
        assert!(service.has_review_for_booking(&booking));
        assert!(!service.has_review_for_booking(&ObjectId::new()));
    }

    #[test]
    fn review_request_validation() {
        let mut req = AddReviewRequest {
            booking: ObjectId::new().to_hex(),
            customer: ReviewerInfo {
                user_id: "u".to_string(),
                name: "n".to_string(),
            },
            rating: 5,
            comment: "great".to_string(),
        };
        assert!(req.validate().is_ok());

        req.rating = 0;
        assert!(req.validate().is_err());
        req.rating = 6;
        assert!(req.validate().is_err());

        req.rating = 3;
        req.comment = "x".repeat(501);
        assert!(req.validate().is_err());
    }

    #[test]
    fn category_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ServiceCategory::Hvac).unwrap(),
            "\"hvac\""
        );
        assert_eq!(
            serde_json::from_str::<ServiceCategory>("\"plumbing\"").unwrap(),
            ServiceCategory::Plumbing
        );
    }
}
