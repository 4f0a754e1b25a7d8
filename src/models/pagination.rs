// src/models/pagination.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Page-number pagination request (`?page=1&page_size=10`).
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct PageParams {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, max = 100000))]
    pub page: i64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub page_size: i64,
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

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit())
    }

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Number of pages needed for `total_items`, rounding up.
pub fn total_pages(total_items: i64, page_size: i64) -> i64 {
    if total_items <= 0 || page_size <= 0 {
        return 0;
    }
    (total_items + page_size - 1) / page_size
}

/// Common envelope for paginated listings.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub page: i64,
    pub page_size: i64,
    pub total_page: i64,
    pub total_items: i64,
    /// Next page number, `None` on the last page.
    pub next: Option<i64>,
    pub data: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    /// Wraps one already-fetched page of `data`.
    pub fn new(params: PageParams, total_items: i64, data: Vec<T>) -> Self {
        let total_page = total_pages(total_items, params.limit());
        Self {
            page: params.page,
            page_size: params.limit(),
            total_page,
            total_items,
            next: (params.page < total_page).then_some(params.page + 1),
            data,
        }
    }

    /// Paginates a fully materialized list in memory.
    pub fn from_items(params: PageParams, items: Vec<T>) -> Self {
        let total_items = items.len() as i64;
        let data = items
            .into_iter()
            .skip(usize::try_from(params.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(params.limit()).unwrap_or(0))
            .collect();
        Self::new(params, total_items, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn test_from_items_middle_page() {
        let page = PaginatedResponse::from_items(PageParams::new(2, 2), vec![1, 2, 3, 4, 5]);
        assert_eq!(page.data, vec![3, 4]);
        assert_eq!(page.total_items, 5);
        assert_eq!(page.total_page, 3);
        assert_eq!(page.next, Some(3));
    }

    #[test]
    fn test_from_items_last_page_has_no_next() {
        let page = PaginatedResponse::from_items(PageParams::new(3, 2), vec![1, 2, 3, 4, 5]);
        assert_eq!(page.data, vec![5]);
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let page = PaginatedResponse::from_items(PageParams::new(9, 2), vec![1, 2, 3]);
        assert!(page.data.is_empty());
        assert_eq!(page.total_page, 2);
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_page_size_out_of_range_fails_validation() {
        assert!(PageParams::new(1, 101).validate().is_err());
        assert!(PageParams::new(0, 10).validate().is_err());
        assert!(PageParams::new(1, 100).validate().is_ok());
        assert!(PageParams::new(i64::MAX, 10).validate().is_err());
    }

    #[test]
    fn test_huge_page_offset_saturates() {
        assert_eq!(PageParams::new(i64::MAX, 100).offset(), i64::MAX);
        assert_eq!(PageParams::new(3, 10).offset(), 20);

        let page = PaginatedResponse::from_items(PageParams::new(i64::MAX, 10), vec![1, 2, 3]);
        assert!(page.data.is_empty());
        assert_eq!(page.next, None);
    }
}
