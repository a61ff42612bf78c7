/// Pagination primitives shared by every list endpoint
///
/// `PageParams` is deserialized straight from the query string
/// (`?page=2&page_size=50`) and clamped before it reaches SQL.

use serde::{Deserialize, Serialize};

/// Default page size when none is requested
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Requested page, 1-based
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: i64,

    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PageParams {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    /// Page number, never below 1
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`
    pub fn page_size(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// SQL LIMIT
    pub fn limit(&self) -> i64 {
        self.page_size()
    }

    /// SQL OFFSET
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.page_size()
    }
}

/// One page of results plus navigation metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: i64, params: PageParams) -> Self {
        let page = params.page();
        let page_size = params.page_size();
        let total_pages = if total_count <= 0 {
            0
        } else {
            (total_count + page_size - 1) / page_size
        };

        Self {
            items,
            total_count: total_count.max(0),
            page,
            page_size,
            total_pages,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        }
    }

    /// Converts every item, keeping the paging metadata
    pub fn map<U, F>(self, f: F) -> PagedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
            has_previous_page: self.has_previous_page,
        }
    }
}
