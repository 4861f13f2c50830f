//! In-memory pagination.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request with a bounded size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Normalize raw query values: page at least 1, limit within
    /// `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Zero-based row offset, for SQL `OFFSET`.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    /// Attach a known total to build the response metadata.
    #[must_use]
    pub fn info(&self, total: u64) -> PageInfo {
        let end = self.offset() + u64::from(self.limit);
        PageInfo {
            page: self.page,
            limit: self.limit,
            total,
            has_more: end < total,
        }
    }
}

/// Pagination metadata returned alongside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub has_more: bool,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            info: self.info,
        }
    }
}

/// Slice `items` to the requested page. `has_more` is `end < total`.
#[must_use]
pub fn paginate<T>(items: Vec<T>, pagination: Pagination) -> Page<T> {
    let total = items.len() as u64;
    let start = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
    let items = items
        .into_iter()
        .skip(start)
        .take(pagination.limit() as usize)
        .collect();
    Page {
        items,
        info: pagination.info(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_bounds() {
        let p = Pagination::new(Some(0), Some(1000));
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), MAX_PAGE_SIZE);
        assert_eq!(Pagination::new(None, Some(0)).limit(), 1);
        assert_eq!(Pagination::new(None, None), Pagination::default());
    }

    #[test]
    fn test_middle_page() {
        let page = paginate((1..=45).collect(), Pagination::new(Some(2), Some(20)));
        assert_eq!(page.items.first(), Some(&21));
        assert_eq!(page.items.len(), 20);
        assert!(page.info.has_more);
        assert_eq!(page.info.total, 45);
    }

    #[test]
    fn test_last_page_has_no_more() {
        let page = paginate((1..=40).collect::<Vec<i32>>(), Pagination::new(Some(2), Some(20)));
        assert_eq!(page.items.len(), 20);
        assert!(!page.info.has_more);
    }

    #[test]
    fn test_past_the_end_is_empty() {
        let page = paginate(vec![1, 2, 3], Pagination::new(Some(5), Some(20)));
        assert!(page.items.is_empty());
        assert!(!page.info.has_more);
        assert_eq!(page.info.total, 3);
    }
}
