//! Offset pagination shared by the document and article listings.

use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_PUBLISHED_PAGE_SIZE: i64 = 20;
pub const DEFAULT_ARTICLE_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// A normalized page request. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Page below 1 becomes 1; a size outside `[1, MAX_PAGE_SIZE]` falls back to `default_size`.
    pub fn or_default(page: i64, page_size: i64, default_size: i64) -> Self {
        let page = page.max(1);
        let page_size = if (1..=MAX_PAGE_SIZE).contains(&page_size) {
            page_size
        } else {
            default_size
        };
        Self { page, page_size }
    }

    /// Page below 1 becomes 1; size is clamped into `[1, MAX_PAGE_SIZE]`.
    pub fn clamped(page: i64, page_size: i64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// One page of results plus the size of the whole result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub request: PageRequest,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn meta(&self) -> PageMeta {
        PageMeta {
            total: self.total,
            page: self.request.page,
            limit: self.request.page_size,
        }
    }
}
