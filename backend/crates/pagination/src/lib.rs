//! Page/limit pagination primitives shared by store backend list endpoints.
//!
//! Handlers accept a [`PageQuery`] from the query string, validate it into a
//! [`PageRequest`], hand the resulting `LIMIT`/`OFFSET` pair to a repository,
//! and wrap the returned rows in a [`Paginated`] envelope:
//!
//! ```
//! use pagination::{PageQuery, Paginated};
//!
//! let request = PageQuery { page: Some(2), limit: Some(10) }
//!     .validate()
//!     .expect("valid page");
//! assert_eq!(request.offset(), 10);
//!
//! let page = Paginated::new(vec!["a", "b"], request, 12);
//! assert_eq!(page.total_pages, 2);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size used when the client does not send `limit`.
pub const DEFAULT_LIMIT: u32 = 20;
/// Largest page size a client may request.
pub const MAX_LIMIT: u32 = 100;

/// Raw pagination parameters as they arrive in a query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageQuery {
    /// One-based page number.
    pub page: Option<u32>,
    /// Requested page size.
    pub limit: Option<u32>,
}

/// Validation failures for [`PageQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageError {
    /// `page` was zero.
    #[error("page must be at least 1")]
    PageOutOfRange,
    /// `limit` was zero or above [`MAX_LIMIT`].
    #[error("limit must be between 1 and {max}")]
    LimitOutOfRange {
        /// Upper bound accepted for `limit`.
        max: u32,
    },
}

impl PageQuery {
    /// Validate the raw parameters, applying defaults for missing values.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] when `page` is zero or `limit` is outside
    /// `1..=MAX_LIMIT`.
    pub fn validate(self) -> Result<PageRequest, PageError> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(PageError::PageOutOfRange);
        }
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(PageError::LimitOutOfRange { max: MAX_LIMIT });
        }
        Ok(PageRequest { page, limit })
    }
}

/// Validated pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Page size.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Row offset for SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// `LIMIT` value in the integer width Diesel binds for `BIGINT`.
    #[must_use]
    pub fn sql_limit(&self) -> i64 {
        i64::from(self.limit)
    }

    /// `OFFSET` value in the integer width Diesel binds for `BIGINT`.
    #[must_use]
    pub fn sql_offset(&self) -> i64 {
        i64::try_from(self.offset()).unwrap_or(i64::MAX)
    }
}

/// Paginated response envelope.
///
/// Serialises as `{ "items": [...], "page": 1, "limit": 20, "total": 42,
/// "total_pages": 3 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// One-based page number.
    pub page: u32,
    /// Page size used for the query.
    pub limit: u32,
    /// Total rows matching the query across all pages.
    pub total: u64,
    /// Number of pages needed to show `total` rows.
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    /// Wrap a page of rows with the request that produced them.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total.div_ceil(u64::from(request.limit)),
        }
    }

    /// Convert each row while keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit coverage for page validation and envelope arithmetic.

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn missing_values_use_defaults() {
        let request = PageQuery::default().validate().expect("defaults are valid");
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), DEFAULT_LIMIT);
        assert_eq!(request.offset(), 0);
    }

    #[rstest]
    #[case(Some(0), None, PageError::PageOutOfRange)]
    #[case(None, Some(0), PageError::LimitOutOfRange { max: MAX_LIMIT })]
    #[case(None, Some(MAX_LIMIT + 1), PageError::LimitOutOfRange { max: MAX_LIMIT })]
    fn rejects_out_of_range_values(
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] expected: PageError,
    ) {
        let err = PageQuery { page, limit }
            .validate()
            .expect_err("out of range values must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case(3, 25, 50)]
    #[case(1, 100, 0)]
    fn offset_skips_previous_pages(#[case] page: u32, #[case] limit: u32, #[case] offset: u64) {
        let request = PageQuery {
            page: Some(page),
            limit: Some(limit),
        }
        .validate()
        .expect("valid request");
        assert_eq!(request.offset(), offset);
        assert_eq!(request.sql_offset(), i64::try_from(offset).expect("small"));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(20, 1)]
    #[case(21, 2)]
    fn total_pages_rounds_up(#[case] total: u64, #[case] pages: u64) {
        let page: Paginated<u8> = Paginated::new(Vec::new(), PageRequest::default(), total);
        assert_eq!(page.total_pages, pages);
    }

    #[rstest]
    fn envelope_serialises_flat_fields() {
        let page = Paginated::new(vec![1, 2], PageRequest::default(), 2).map(|n| n * 10);
        let value = serde_json::to_value(&page).expect("serialise envelope");
        assert_eq!(value["items"], serde_json::json!([10, 20]));
        assert_eq!(value["total_pages"], 1);
    }
}
