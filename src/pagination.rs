//! Page-number pagination shared by the list endpoints.

use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw `page`/`limit` query values as list endpoints receive them.
#[derive(Debug, Default, Clone, Copy)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Resolved pagination: clamped page/limit plus the SQL offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl PageParams {
    pub fn resolve(self) -> Page {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Page {
            page,
            limit,
            offset: (page - 1) * limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMetadata {
    /// Total number of items available
    pub total: i64,
    /// 1-based page number
    pub page: i64,
    /// Page size
    pub limit: i64,
}

impl PaginationMetadata {
    pub fn new(total: i64, page: Page) -> Self {
        Self {
            total,
            page: page.page,
            limit: page.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let page = PageParams::default().resolve();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_offset_from_page_number() {
        let page = PageParams {
            page: Some(3),
            limit: Some(10),
        }
        .resolve();
        assert_eq!(page.offset, 20);
    }

    #[test]
    fn test_clamping() {
        let page = PageParams {
            page: Some(0),
            limit: Some(0),
        }
        .resolve();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 1);

        let page = PageParams {
            page: Some(-4),
            limit: Some(10_000),
        }
        .resolve();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, MAX_PAGE_SIZE);
    }
}
