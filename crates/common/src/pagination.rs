//! Page requests and paged results.

use serde::{Deserialize, Serialize};

/// Upper bound on the page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request. Only built through [`PageRequest::new`], so the
/// page is never 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Creates a page request, clamping `page` to at least 1 and `limit`
    /// to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Builds a request from optional query values with a default limit.
    pub fn from_query(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        Self::new(page.unwrap_or(1), limit.unwrap_or(default_limit))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of records to skip before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    /// Slices an already filtered and sorted collection into a page.
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(request.limit() as usize)
            .collect();
        Self {
            items,
            total,
            request,
        }
    }

    /// Returns the pagination block exposed to clients.
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.request, self.total)
    }

    /// Converts every item, keeping the paging data.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }
}

/// Client-facing pagination summary: `{current, pages, total, limit}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current: u32,
    pub pages: u64,
    pub total: u64,
    pub limit: u32,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            current: request.page(),
            pages: total.div_ceil(u64::from(request.limit())),
            total,
            limit: request.limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_page_and_limit() {
        let req = PageRequest::new(0, 0);
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), 1);

        let req = PageRequest::new(3, 1000);
        assert_eq!(req.limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_offset_skips_previous_pages() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
        assert_eq!(PageRequest::new(0, 20).offset(), 0);
    }

    #[test]
    fn test_from_sorted_slices_the_requested_page() {
        let page = Page::from_sorted((1..=25).collect::<Vec<_>>(), PageRequest::new(3, 10));
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);

        let p = page.pagination();
        assert_eq!(p.current, 3);
        assert_eq!(p.pages, 3);
        assert_eq!(p.limit, 10);
    }

    #[test]
    fn test_empty_result_has_zero_pages() {
        let page: Page<u8> = Page::from_sorted(vec![], PageRequest::default());
        assert_eq!(page.pagination().pages, 0);
    }
}
