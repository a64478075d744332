//! Pagination parameters for list endpoints

use serde::Deserialize;

/// Query parameters shared by paginated listings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PaginationParams {
    /// Page number (1-indexed)
    pub page: Option<u32>,

    /// Items per page
    pub limit: Option<u32>,
}

impl PaginationParams {
    /// Maximum allowed items per page
    pub const MAX_LIMIT: u32 = 100;

    /// Returns the clamped limit value
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).clamp(1, Self::MAX_LIMIT)
    }

    /// Returns the page (1-indexed, minimum 1)
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Number of documents to skip
    pub fn skip(&self) -> u64 {
        u64::from((self.page() - 1) * self.limit())
    }

    /// Total page count for a given number of matching documents
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let p = PaginationParams::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);
        assert_eq!(p.skip(), 0);

        let p = PaginationParams {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), PaginationParams::MAX_LIMIT);
    }

    #[test]
    fn skip_and_total_pages() {
        let p = PaginationParams {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(p.skip(), 20);
        assert_eq!(p.total_pages(25), 3);
        assert_eq!(p.total_pages(30), 3);
        assert_eq!(p.total_pages(0), 0);
    }
}
