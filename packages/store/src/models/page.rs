//! List envelopes and pagination bookkeeping for admin tables.

use serde::{Deserialize, Serialize};

/// One page of a list endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(alias = "rows", alias = "items")]
    pub data: Vec<T>,
    #[serde(default, alias = "count", alias = "totalItems")]
    pub total: u64,
    #[serde(default = "first_page", alias = "currentPage")]
    pub page: u32,
    #[serde(default, alias = "totalPages")]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    pub fn pagination(&self, per_page: u32) -> Pagination {
        Pagination::new(self.page, per_page, self.total)
    }
}

/// Page arithmetic. `page` and `per_page` are clamped to at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            total,
        }
    }

    pub fn total_pages(&self) -> u32 {
        self.total.div_ceil(self.per_page as u64) as u32
    }

    /// Zero-based index of the first row on this page.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Apply the page window to rows already held client-side.
    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        let start = (self.offset() as usize).min(rows.len());
        let end = (start + self.per_page as usize).min(rows.len());
        &rows[start..end]
    }
}
