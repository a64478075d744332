//! Provider statistics
//!
//! Derived on demand from the join of a provider's services with every
//! booking referencing them. Nothing here is persisted; the whole snapshot is
//! recomputed on each request from two collection scans. No pagination on the
//! underlying join, which is fine at the expected scale.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use super::booking::{Booking, BookingStatus};
use super::service::Service;

/// How many trailing calendar months the revenue series covers
const MONTHLY_WINDOW: i32 = 6;

/// How many services the performance ranking reports
const TOP_SERVICES: usize = 5;

/// How many bookings the recent-activity list reports
const RECENT_BOOKINGS: usize = 10;

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsByStatus {
    pub pending: u64,
    pub confirmed: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub cancelled: u64,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    /// "Mon YYYY" label, e.g. "Aug 2026"
    pub month: String,
    /// Revenue from completed bookings created in that month
    pub revenue: f64,
    /// All bookings created in that month, regardless of status
    pub bookings: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopService {
    pub id: String,
    pub name: String,
    pub category: String,
    pub rating: f64,
    pub review_count: i64,
    pub booking_count: u64,
    /// Completed-booking revenue for this service
    pub revenue: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentBooking {
    pub id: String,
    pub customer_name: String,
    pub booking_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub price: f64,
    /// Service name resolved against the fetched service set
    pub service: String,
}

/// The full derived snapshot for one provider
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    pub total_services: u64,
    pub total_bookings: u64,
    pub bookings_by_status: BookingsByStatus,
    pub total_revenue: f64,
    pub pending_revenue: f64,
    pub average_rating: f64,
    pub total_reviews: i64,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub top_services: Vec<TopService>,
    pub recent_bookings: Vec<RecentBooking>,
}

/// Compute the provider snapshot from the joined document sets.
///
/// `now` anchors the trailing monthly window; callers pass `Utc::now()`.
pub fn compute_provider_stats(
    services: &[Service],
    bookings: &[Booking],
    now: DateTime<Utc>,
) -> ProviderStats {
    let mut by_status = BookingsByStatus::default();
    for b in bookings {
        match b.status {
            BookingStatus::Pending => by_status.pending += 1,
            BookingStatus::Confirmed => by_status.confirmed += 1,
            BookingStatus::InProgress => by_status.in_progress += 1,
            BookingStatus::Completed => by_status.completed += 1,
            BookingStatus::Cancelled => by_status.cancelled += 1,
        }
    }

    let total_revenue: f64 = bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Completed)
        .map(|b| b.price)
        .sum();

    let pending_revenue: f64 = bookings
        .iter()
        .filter(|b| {
            matches!(
                b.status,
                BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::InProgress
            )
        })
        .map(|b| b.price)
        .sum();

    // Unweighted mean of each service's own average, matching the numbers
    // the dashboard has always shown.
    let average_rating = if services.is_empty() {
        0.0
    } else {
        services.iter().map(|s| s.rating.average).sum::<f64>() / services.len() as f64
    };

    let total_reviews: i64 = services.iter().map(|s| s.rating.count).sum();

    ProviderStats {
        total_services: services.len() as u64,
        total_bookings: bookings.len() as u64,
        bookings_by_status: by_status,
        total_revenue,
        pending_revenue,
        average_rating,
        total_reviews,
        monthly_revenue: monthly_revenue(bookings, now),
        top_services: top_services(services, bookings),
        recent_bookings: recent_bookings(services, bookings),
    }
}

/// Year/month pair as a single month index, for calendar arithmetic
fn month_index(date: &DateTime<Utc>) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// Revenue and booking-count buckets for the trailing six calendar months,
/// oldest first, including the current month. Months without activity are
/// reported with zeros rather than omitted.
fn monthly_revenue(bookings: &[Booking], now: DateTime<Utc>) -> Vec<MonthlyRevenue> {
    let current = month_index(&now);

    (0..MONTHLY_WINDOW)
        .rev()
        .map(|offset| {
            let index = current - offset;
            let year = index.div_euclid(12);
            let month = index.rem_euclid(12) as u32 + 1;
            // First of the month is always a valid date
            let label = NaiveDate::from_ymd_opt(year, month, 1)
                .expect("valid month start")
                .format("%b %Y")
                .to_string();

            let in_month = |b: &&Booking| month_index(&b.created_at) == index;

            let revenue = bookings
                .iter()
                .filter(in_month)
                .filter(|b| b.status == BookingStatus::Completed)
                .map(|b| b.price)
                .sum();
            let count = bookings.iter().filter(in_month).count() as u64;

            MonthlyRevenue {
                month: label,
                revenue,
                bookings: count,
            }
        })
        .collect()
}

/// Top services by booking count (computed from the fetched booking set, not
/// the stored counter), ties broken deterministically by service id.
fn top_services(services: &[Service], bookings: &[Booking]) -> Vec<TopService> {
    let mut ranked: Vec<TopService> = services
        .iter()
        .map(|service| {
            let id = service.id.unwrap_or_default();
            let for_service: Vec<&Booking> =
                bookings.iter().filter(|b| b.service == id).collect();
            let revenue = for_service
                .iter()
                .filter(|b| b.status == BookingStatus::Completed)
                .map(|b| b.price)
                .sum();

            TopService {
                id: id.to_hex(),
                name: service.name.clone(),
                category: service.category.to_string(),
                rating: service.rating.average,
                review_count: service.rating.count,
                booking_count: for_service.len() as u64,
                revenue,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.booking_count.cmp(&a.booking_count).then(a.id.cmp(&b.id)));
    ranked.truncate(TOP_SERVICES);
    ranked
}

/// The ten most recent bookings, newest first, projected to a flat shape.
/// A booking whose service is not in the fetched set reports "Unknown".
fn recent_bookings(services: &[Service], bookings: &[Booking]) -> Vec<RecentBooking> {
    let mut sorted: Vec<&Booking> = bookings.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    sorted
        .into_iter()
        .take(RECENT_BOOKINGS)
        .map(|b| RecentBooking {
            id: b.id.unwrap_or_default().to_hex(),
            customer_name: b.customer.name.clone(),
            booking_date: b.booking_date,
            status: b.status,
            price: b.price,
            service: services
                .iter()
                .find(|s| s.id == Some(b.service))
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::{Location, PartyInfo};
    use crate::domain::service::{ProviderInfo, RatingSummary, ServiceCategory};
    use bson::oid::ObjectId;
    use chrono::TimeZone;

    fn service(id: ObjectId, name: &str, price: f64, rating: RatingSummary) -> Service {
        let now = Utc::now();
        Service {
            id: Some(id),
            name: name.to_string(),
            category: ServiceCategory::Cleaning,
            description: "d".to_string(),
            price,
            image: String::new(),
            provider: ProviderInfo {
                user_id: "prov-1".to_string(),
                name: "Pat".to_string(),
                email: "pat@example.com".to_string(),
                verified: true,
            },
            available: true,
            rating,
            booking_count: 0,
            reviews: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn booking(
        service: ObjectId,
        status: BookingStatus,
        price: f64,
        created_at: DateTime<Utc>,
    ) -> Booking {
        Booking {
            id: Some(ObjectId::new()),
            service,
            customer: PartyInfo {
                user_id: "cust-1".to_string(),
                name: "Cleo".to_string(),
                email: "cleo@example.com".to_string(),
            },
            provider: PartyInfo {
                user_id: "prov-1".to_string(),
                name: "Pat".to_string(),
                email: "pat@example.com".to_string(),
            },
            booking_date: created_at,
            booking_time: "09:00".to_string(),
            location: Location {
                address: "1 Main St".to_string(),
                city: None,
                zip_code: None,
            },
            status,
            price,
            duration: 1.0,
            notes: None,
            cancellation_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn revenue_counts_only_completed_bookings() {
        // Provider with two services: A has 3 completed at $50 and one
        // cancelled at $50; B has 1 completed at $80.
        let a = ObjectId::new();
        let b = ObjectId::new();
        let now = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();

        let services = vec![
            service(a, "A", 50.0, RatingSummary::default()),
            service(b, "B", 80.0, RatingSummary::default()),
        ];
        let bookings = vec![
            booking(a, BookingStatus::Completed, 50.0, now),
            booking(a, BookingStatus::Completed, 50.0, now),
            booking(a, BookingStatus::Completed, 50.0, now),
            booking(a, BookingStatus::Cancelled, 50.0, now),
            booking(b, BookingStatus::Completed, 80.0, now),
        ];

        let stats = compute_provider_stats(&services, &bookings, now);
        assert_eq!(stats.total_revenue, 230.0);
        assert_eq!(stats.total_bookings, 5);
        assert_eq!(stats.total_services, 2);
        assert_eq!(stats.bookings_by_status.completed, 4);
        assert_eq!(stats.bookings_by_status.cancelled, 1);
        assert_eq!(stats.pending_revenue, 0.0);
    }

    #[test]
    fn demoting_a_completed_booking_removes_its_revenue() {
        let a = ObjectId::new();
        let now = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();
        let services = vec![service(a, "A", 50.0, RatingSummary::default())];
        let mut bookings = vec![
            booking(a, BookingStatus::Completed, 50.0, now),
            booking(a, BookingStatus::Completed, 70.0, now),
        ];

        assert_eq!(
            compute_provider_stats(&services, &bookings, now).total_revenue,
            120.0
        );

        bookings[1].status = BookingStatus::InProgress;
        let stats = compute_provider_stats(&services, &bookings, now);
        assert_eq!(stats.total_revenue, 50.0);
        assert_eq!(stats.pending_revenue, 70.0);
    }

    #[test]
    fn pending_revenue_covers_all_open_states() {
        let a = ObjectId::new();
        let now = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();
        let services = vec![service(a, "A", 10.0, RatingSummary::default())];
        let bookings = vec![
            booking(a, BookingStatus::Pending, 10.0, now),
            booking(a, BookingStatus::Confirmed, 20.0, now),
            booking(a, BookingStatus::InProgress, 30.0, now),
            booking(a, BookingStatus::Cancelled, 40.0, now),
        ];

        let stats = compute_provider_stats(&services, &bookings, now);
        assert_eq!(stats.pending_revenue, 60.0);
        assert_eq!(stats.total_revenue, 0.0);
    }

    #[test]
    fn monthly_buckets_are_six_chronological_and_zero_filled() {
        let a = ObjectId::new();
        let now = Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap();
        let services = vec![service(a, "A", 50.0, RatingSummary::default())];
        let bookings = vec![
            // Current month, completed
            booking(
                a,
                BookingStatus::Completed,
                100.0,
                Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap(),
            ),
            // Two months back, completed (crosses the year boundary)
            booking(
                a,
                BookingStatus::Completed,
                40.0,
                Utc.with_ymd_and_hms(2025, 12, 31, 23, 0, 0).unwrap(),
            ),
            // Two months back, pending: counted in bookings, not revenue
            booking(
                a,
                BookingStatus::Pending,
                40.0,
                Utc.with_ymd_and_hms(2025, 12, 5, 9, 0, 0).unwrap(),
            ),
            // Older than the window: ignored entirely
            booking(
                a,
                BookingStatus::Completed,
                999.0,
                Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
            ),
        ];

        let months = monthly_revenue(&bookings, now);
        assert_eq!(months.len(), 6);

        let labels: Vec<&str> = months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Sep 2025", "Oct 2025", "Nov 2025", "Dec 2025", "Jan 2026", "Feb 2026"
            ]
        );

        assert_eq!(months[0], MonthlyRevenue {
            month: "Sep 2025".to_string(),
            revenue: 0.0,
            bookings: 0,
        });
        assert_eq!(months[3].revenue, 40.0);
        assert_eq!(months[3].bookings, 2);
        assert_eq!(months[5].revenue, 100.0);
        assert_eq!(months[5].bookings, 1);
    }

    #[test]
    fn top_services_ranks_by_count_with_id_tiebreak() {
        let now = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();
        let mut ids = [ObjectId::new(), ObjectId::new(), ObjectId::new()];
        ids.sort();
        let [low, mid, high] = ids;

        let services = vec![
            service(high, "High", 10.0, RatingSummary::default()),
            service(low, "Low", 10.0, RatingSummary::default()),
            service(mid, "Mid", 10.0, RatingSummary::default()),
        ];
        // Tie between `high` and `low` on two bookings each; `mid` has three.
        let bookings = vec![
            booking(high, BookingStatus::Completed, 10.0, now),
            booking(high, BookingStatus::Pending, 10.0, now),
            booking(low, BookingStatus::Completed, 10.0, now),
            booking(low, BookingStatus::Cancelled, 10.0, now),
            booking(mid, BookingStatus::Completed, 10.0, now),
            booking(mid, BookingStatus::Completed, 10.0, now),
            booking(mid, BookingStatus::Pending, 10.0, now),
        ];

        let top = top_services(&services, &bookings);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].id, mid.to_hex());
        assert_eq!(top[0].booking_count, 3);
        assert_eq!(top[0].revenue, 20.0);
        // Tie resolved by hex id ascending
        assert_eq!(top[1].id, low.to_hex());
        assert_eq!(top[2].id, high.to_hex());
    }

    #[test]
    fn top_services_caps_at_five() {
        let now = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();
        let services: Vec<Service> = (0..7)
            .map(|i| {
                service(
                    ObjectId::new(),
                    &format!("S{i}"),
                    10.0,
                    RatingSummary::default(),
                )
            })
            .collect();
        let top = top_services(&services, &[]);
        assert_eq!(top.len(), 5);
    }

    #[test]
    fn recent_bookings_newest_first_with_unknown_placeholder() {
        let a = ObjectId::new();
        let orphan = ObjectId::new();
        let base = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let services = vec![service(a, "Known", 10.0, RatingSummary::default())];

        let mut bookings = Vec::new();
        for i in 0..12 {
            bookings.push(booking(
                a,
                BookingStatus::Completed,
                10.0,
                base + chrono::Duration::hours(i),
            ));
        }
        // Newest booking references a service outside the fetched set
        bookings.push(booking(
            orphan,
            BookingStatus::Pending,
            10.0,
            base + chrono::Duration::hours(100),
        ));

        let recent = recent_bookings(&services, &bookings);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].service, "Unknown");
        assert_eq!(recent[1].service, "Known");
        // Strictly newest-first
        for pair in recent.windows(2) {
            assert!(pair[0].booking_date >= pair[1].booking_date);
        }
    }

    #[test]
    fn average_rating_is_the_unweighted_mean_of_service_averages() {
        let now = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();
        let services = vec![
            service(
                ObjectId::new(),
                "A",
                10.0,
                RatingSummary {
                    average: 5.0,
                    count: 1,
                },
            ),
            service(
                ObjectId::new(),
                "B",
                10.0,
                RatingSummary {
                    average: 3.0,
                    count: 100,
                },
            ),
        ];

        let stats = compute_provider_stats(&services, &[], now);
        assert_eq!(stats.average_rating, 4.0);
        assert_eq!(stats.total_reviews, 101);
    }

    #[test]
    fn empty_provider_reports_zeroes() {
        let now = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();
        let stats = compute_provider_stats(&[], &[], now);
        assert_eq!(stats.total_services, 0);
        assert_eq!(stats.total_bookings, 0);
        assert_eq!(stats.total_revenue, 0.0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.monthly_revenue.len(), 6);
        assert!(stats.top_services.is_empty());
        assert!(stats.recent_bookings.is_empty());
    }

    #[test]
    fn stats_serialize_with_camel_case_keys() {
        let now = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();
        let stats = compute_provider_stats(&[], &[], now);
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("totalRevenue").is_some());
        assert!(json.get("bookingsByStatus").is_some());
        assert!(json["bookingsByStatus"].get("inProgress").is_some());
        assert!(json.get("monthlyRevenue").is_some());
        assert!(json.get("topServices").is_some());
        assert!(json.get("recentBookings").is_some());
    }
}
