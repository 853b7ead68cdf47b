//! Page-number pagination shared by the listing surfaces.
//!
//! Pages are 1-indexed. An empty result set still has one page, so UI
//! pagers always have something to render.

use serde::{Deserialize, Serialize};

/// Items per page on every listing surface.
pub const DEFAULT_PAGE_SIZE: u32 = 15;

/// A request for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-indexed page number.
    pub page: u32,
    /// Items per page.
    pub page_size: u32,
}

impl PageRequest {
    /// Creates a request, clamping `page` to at least 1 and `page_size` to
    /// at least 1.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// The zero-based offset of this page's first item.
    pub fn offset(&self) -> usize {
        ((self.page - 1) as usize) * (self.page_size as usize)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results with pager metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Total items across all pages.
    pub total: u64,
    /// 1-indexed page number of this page.
    pub page: u32,
    /// Items per page.
    pub page_size: u32,
    /// Total page count; at least 1 even when `total` is 0.
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Assembles a page from the items for it and the overall total.
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let page_size = request.page_size.max(1);
        let total_pages = (total.div_ceil(page_size as u64) as u32).max(1);
        Self {
            items,
            total,
            page: request.page.max(1),
            page_size,
            total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Maps the items, preserving pager metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_has_one_page() {
        let page: Page<i32> = Page::new(vec![], 0, PageRequest::default());
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page: Page<i32> = Page::new(vec![], 31, PageRequest::new(1, 15));
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_exact_multiple_does_not_overcount() {
        let page: Page<i32> = Page::new(vec![], 30, PageRequest::new(2, 15));
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_request_clamps_zero_page() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 1);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_offset_advances_by_page_size() {
        assert_eq!(PageRequest::new(3, 15).offset(), 30);
    }

    #[test]
    fn test_map_preserves_metadata() {
        let page = Page::new(vec![1, 2, 3], 10, PageRequest::new(1, 3));
        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.items, vec!["1", "2", "3"]);
        assert_eq!(mapped.total, 10);
        assert_eq!(mapped.total_pages, 4);
    }
}
