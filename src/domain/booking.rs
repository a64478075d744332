//! Booking documents and the booking lifecycle
//!
//! Status moves monotonically along pending -> confirmed -> in-progress ->
//! completed; cancellation is reachable from any non-terminal state. Once a
//! booking is completed or cancelled no further transition is accepted.
//!
//! Writes are last-write-wins: there is no compare-and-swap on the status
//! field, so two concurrent transitions can both succeed with the later one
//! standing. Accepted at this scale.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::service::Service;

/// Booking lifecycle states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Legal successor check for the transition table:
    /// each state advances by exactly one step, and cancellation is legal
    /// from every non-terminal state.
    pub fn can_transition_to(self, target: Self) -> bool {
        match (self, target) {
            (Self::Pending, Self::Confirmed) => true,
            (Self::Confirmed, Self::InProgress) => true,
            (Self::InProgress, Self::Completed) => true,
            (from, Self::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Customer or provider identity snapshotted onto a booking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyInfo {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

/// Where the work happens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

fn default_duration() -> f64 {
    1.0
}

/// Booking document
///
/// `price` and `provider` are copied from the service at creation time, so a
/// later service edit never alters existing bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub service: ObjectId,
    pub customer: PartyInfo,
    pub provider: PartyInfo,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub booking_date: DateTime<Utc>,
    pub booking_time: String,
    pub location: Location,
    pub status: BookingStatus,
    pub price: f64,
    /// Duration in hours
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<bson::DateTime>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a booking
///
/// Price and provider identity are not accepted from the client; they are
/// snapshotted from the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Service to book (hex ObjectId)
    pub service: String,
    pub customer: PartyInfo,
    pub booking_date: DateTime<Utc>,
    pub booking_time: String,
    pub location: Location,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateBookingRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.booking_time.trim().is_empty() {
            return Err("Booking time is required".to_string());
        }
        if self.location.address.trim().is_empty() {
            return Err("Address is required".to_string());
        }
        if let Some(notes) = &self.notes {
            if notes.len() > 500 {
                return Err("Notes cannot exceed 500 characters".to_string());
            }
        }
        if let Some(duration) = self.duration {
            if duration <= 0.0 || !duration.is_finite() {
                return Err("Duration must be positive".to_string());
            }
        }
        Ok(())
    }

    /// Build the document, snapshotting price and provider from the service
    pub fn into_booking(self, service: &Service, now: DateTime<Utc>) -> Booking {
        let service_id = service.id.unwrap_or_default();
        Booking {
            id: None,
            service: service_id,
            customer: self.customer,
            provider: PartyInfo {
                user_id: service.provider.user_id.clone(),
                name: service.provider.name.clone(),
                email: service.provider.email.clone(),
            },
            booking_date: self.booking_date,
            booking_time: self.booking_time,
            location: self.location,
            status: BookingStatus::Pending,
            price: service.price,
            duration: self.duration.unwrap_or_else(default_duration),
            notes: self.notes,
            cancellation_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request body for the status transition endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

/// Request body for the cancellation endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBookingRequest {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub cancelled_by: Option<String>,
}

/// Booking as returned over the wire
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub service: String,
    pub customer: PartyInfo,
    pub provider: PartyInfo,
    pub booking_date: DateTime<Utc>,
    pub booking_time: String,
    pub location: Location,
    pub status: BookingStatus,
    pub price: f64,
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id.unwrap_or_default().to_hex(),
            service: b.service.to_hex(),
            customer: b.customer,
            provider: b.provider,
            booking_date: b.booking_date,
            booking_time: b.booking_time,
            location: b.location,
            status: b.status,
            price: b.price,
            duration: b.duration,
            notes: b.notes,
            cancellation_reason: b.cancellation_reason,
            cancelled_by: b.cancelled_by,
            cancelled_at: b.cancelled_at.map(|d| d.to_chrono()),
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingStatus::*;

    #[test]
    fn forward_transitions_advance_one_step() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));

        // No skipping ahead or moving backwards
        assert!(!Pending.can_transition_to(InProgress));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!InProgress.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(InProgress));
    }

    #[test]
    fn cancellation_is_reachable_from_non_terminal_states_only() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for target in [Pending, Confirmed, InProgress, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(target));
            assert!(!Cancelled.can_transition_to(target));
        }
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Pending.is_terminal());
    }

    #[test]
    fn status_uses_kebab_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&InProgress).unwrap(), "\"in-progress\"");
        assert_eq!(
            serde_json::from_str::<BookingStatus>("\"cancelled\"").unwrap(),
            Cancelled
        );
    }

    #[test]
    fn booking_snapshots_price_and_provider() {
        use crate::domain::service::{ProviderInfo, RatingSummary, ServiceCategory};

        let now = Utc::now();
        let mut service = Service {
            id: Some(ObjectId::new()),
            name: "Deep clean".to_string(),
            category: ServiceCategory::Cleaning,
            description: "d".to_string(),
            price: 80.0,
            image: String::new(),
            provider: ProviderInfo {
                user_id: "prov-1".to_string(),
                name: "Pat".to_string(),
                email: "pat@example.com".to_string(),
                verified: true,
            },
            available: true,
            rating: RatingSummary::default(),
            booking_count: 0,
            reviews: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let req = CreateBookingRequest {
            service: service.id.unwrap().to_hex(),
            customer: PartyInfo {
                user_id: "cust-1".to_string(),
                name: "Cleo".to_string(),
                email: "cleo@example.com".to_string(),
            },
            booking_date: now,
            booking_time: "09:00".to_string(),
            location: Location {
                address: "1 Main St".to_string(),
                city: None,
                zip_code: None,
            },
            duration: None,
            notes: None,
        };
        let booking = req.into_booking(&service, now);

        assert_eq!(booking.price, 80.0);
        assert_eq!(booking.provider.user_id, "prov-1");
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.duration, 1.0);

        // Editing the service afterwards must not affect the snapshot
        service.price = 200.0;
        service.provider.name = "Someone Else".to_string();
        assert_eq!(booking.price, 80.0);
        assert_eq!(booking.provider.name, "Pat");
    }
}
