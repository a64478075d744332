//! Domain documents, DTOs, and the derived-statistics logic

pub mod booking;
pub mod service;
pub mod stats;
pub mod user;

pub use booking::{Booking, BookingStatus};
pub use service::Service;
pub use user::User;
