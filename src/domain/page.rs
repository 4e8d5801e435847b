//! Pagination primitives

use serde::Serialize;

use super::DomainError;

/// Zero-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    size: i64,
}

impl PageRequest {
    /// # Errors
    /// - `DomainError::Validation` if `page` is negative or `size` is not positive
    pub fn new(page: i64, size: i64) -> Result<Self, DomainError> {
        if page < 0 {
            return Err(DomainError::validation("page must not be negative"));
        }
        if size < 1 {
            return Err(DomainError::validation("size must be positive"));
        }
        Ok(Self { page, size })
    }

    /// Clamp the page size to an upper bound chosen by the caller
    pub fn capped(self, max_size: i64) -> Self {
        Self {
            page: self.page,
            size: self.size.min(max_size.max(1)),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

/// One page of results plus the total count across all pages
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_records: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_records: i64) -> Self {
        Self {
            items,
            total_records,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_records: self.total_records,
        }
    }
}
