use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{errors::SearchError, params::ParameterSet};

pub const PAGE_PARAM: &str = "page";
pub const PER_PAGE_PARAM: &str = "per_page";

/// Requested page window. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Pages below 1 are accepted and simply return nothing.
    pub page: i64,
    pub per_page: u64,
}

/// Pagination block of a search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationInfo {
    pub page: i64,
    /// Number of records on this page.
    pub page_count: u64,
    /// Number of records matching the search across all pages.
    pub total_count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

fn parse_integer(params: &ParameterSet, key: &str) -> Result<Option<i64>, SearchError> {
    params
        .get_str(key)
        .map(|text| text.trim().parse::<i64>().map_err(|_| SearchError::PageNotAnInteger))
        .transpose()
}

impl Pagination {
    /// Read `page` (default 1) and `per_page` (default `default_per_page`).
    ///
    /// # Errors
    ///
    /// `PageNotAnInteger` when either value is not an integer, or when
    /// `per_page` is not positive.
    pub fn from_params(params: &ParameterSet, default_per_page: u64) -> Result<Self, SearchError> {
        let page = parse_integer(params, PAGE_PARAM)?.unwrap_or(1);
        let per_page = match parse_integer(params, PER_PAGE_PARAM)? {
            Some(value) => u64::try_from(value)
                .ok()
                .filter(|&v| v > 0)
                .ok_or(SearchError::PageNotAnInteger)?,
            None => default_per_page.max(1),
        };
        Ok(Self { page, per_page })
    }

    /// Row offset of the page, `None` for pages below 1.
    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        let page = u64::try_from(self.page).ok().filter(|&p| p >= 1)?;
        (page - 1).checked_mul(self.per_page)
    }

    #[must_use]
    pub fn limit(&self) -> u64 {
        self.per_page
    }

    #[must_use]
    pub fn info(&self, page_count: u64, total_count: u64) -> PaginationInfo {
        let has_next = self
            .offset()
            .is_some_and(|offset| offset.saturating_add(page_count) < total_count);
        PaginationInfo {
            page: self.page,
            page_count,
            total_count,
            has_next,
            has_previous: self.page > 1,
        }
    }
}
