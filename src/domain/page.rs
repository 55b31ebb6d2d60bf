//! Pagination envelope for history queries.

use serde::Serialize;

/// One page of a larger result set. `current_page` is 1-indexed and
/// `total_pages == ceil(total_items / size)` for the size that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedHistory<T> {
    pub data: Vec<T>,
    pub current_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl<T> PaginatedHistory<T> {
    pub fn new(data: Vec<T>, current_page: i64, total_items: i64, size: i64) -> Self {
        Self {
            data,
            current_page,
            total_items,
            total_pages: total_pages(total_items, size),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedHistory<U> {
        PaginatedHistory {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Ceiling division; zero items means zero pages.
pub fn total_pages(total_items: i64, size: i64) -> i64 {
    debug_assert!(size >= 1);
    (total_items + size - 1) / size
}
