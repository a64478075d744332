//! API response types and pagination utilities

pub mod pagination;
pub mod response;

pub use pagination::PaginationParams;
pub use response::{Created, MessageResponse};
