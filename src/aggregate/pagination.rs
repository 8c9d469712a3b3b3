/// Page/limit parsing and the paginated result envelope
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Validated `page` and `limit` query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Parse raw query values. Absent or blank values take the defaults;
    /// anything that is not a positive integer is `InvalidInput`.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> ApiResult<Self> {
        let page = parse_positive(page, "page", DEFAULT_PAGE)?;
        let limit = parse_positive(limit, "limit", DEFAULT_LIMIT)?;
        Ok(Self { page, limit })
    }

    /// Rows to skip: `(page - 1) * limit`, never negative
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit).max(0)
    }
}

fn parse_positive(raw: Option<&str>, name: &str, default: i64) -> ApiResult<i64> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(default),
    };

    match raw.parse::<i64>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(ApiError::InvalidInput(format!(
            "{} must be a positive integer",
            name
        ))),
    }
}

/// One page of results plus totals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, total_docs: i64, pagination: Pagination) -> Self {
        let total_pages = if total_docs <= 0 {
            0
        } else {
            (total_docs - 1) / pagination.limit + 1
        };
        Self {
            docs,
            total_docs,
            page: pagination.page,
            limit: pagination.limit,
            total_pages,
            has_next_page: pagination.page < total_pages,
            has_prev_page: pagination.page > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            docs: self.docs.into_iter().map(f).collect(),
            total_docs: self.total_docs,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
            has_prev_page: self.has_prev_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(Pagination::parse(None, None).unwrap(), Pagination::default());
        assert_eq!(Pagination::parse(Some(""), Some(" ")).unwrap(), Pagination::default());
    }

    #[test]
    fn test_rejects_non_positive_or_non_numeric() {
        for (page, limit) in [
            (Some("abc"), None),
            (None, Some("0")),
            (Some("0"), None),
            (Some("-2"), None),
            (None, Some("1.5")),
        ] {
            assert!(
                matches!(Pagination::parse(page, limit), Err(ApiError::InvalidInput(_))),
                "page={:?} limit={:?}",
                page,
                limit
            );
        }
    }

    #[test]
    fn test_offset() {
        let p = Pagination::parse(Some("3"), Some("10")).unwrap();
        assert_eq!(p.offset(), 20);
        assert_eq!(Pagination::default().offset(), 0);
    }

    #[test]
    fn test_page_totals() {
        let page = Page::new(vec![1, 2, 3, 4, 5], 25, Pagination { page: 3, limit: 10 });
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next_page);
        assert!(page.has_prev_page);

        let empty: Page<i32> = Page::new(Vec::new(), 0, Pagination::default());
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_prev_page);
    }

    #[test]
    fn test_huge_limit_does_not_overflow() {
        let pagination = Pagination::parse(Some("1"), Some("9223372036854775807")).unwrap();
        assert_eq!(pagination.limit, i64::MAX);

        let page = Page::new(vec![1, 2], 2, pagination);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next_page);

        let last = Page::new(Vec::<i32>::new(), i64::MAX, Pagination { page: 2, limit: 1 });
        assert_eq!(last.total_pages, i64::MAX);
        assert!(last.has_next_page);
    }
}
