use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("page must be >= 1, got {0}")]
    InvalidPage(u32),

    #[error("page_size must be between 1 and 100, got {0}")]
    InvalidPageSize(u32),

    #[error("start_date {start} is after end_date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("limit must be >= 1")]
    InvalidLimit,
}

/// One extracted event listing.
///
/// Produced only by the extractor and immutable afterwards. `id` is the
/// site-assigned identifier and is never empty; `url` is absolute and
/// references the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Best-effort start time, captured when the page carries a
    /// machine-readable date. Not guaranteed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
}

/// Validated search parameters, constructed once per incoming query and
/// read-only thereafter.
///
/// The orchestrator trusts these invariants; [`SearchFilter::new`] and the
/// `with_*` builders are the only way the API layer should produce one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Location slugs, e.g. `spain--barcelona`.
    pub locations: Vec<String>,
    pub keywords: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// 1-based result page.
    pub page: u32,
    /// Records per page, 1..=100.
    pub page_size: u32,
    /// Optional hard cap applied after the page slice.
    pub limit: Option<usize>,
}

impl SearchFilter {
    /// Creates a filter with no location, keyword, or date constraints.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPage`] when `page` is 0 and
    /// [`CoreError::InvalidPageSize`] when `page_size` is outside 1..=100.
    pub fn new(page: u32, page_size: u32) -> Result<Self, CoreError> {
        if page < 1 {
            return Err(CoreError::InvalidPage(page));
        }
        if !(1..=100).contains(&page_size) {
            return Err(CoreError::InvalidPageSize(page_size));
        }
        Ok(Self {
            locations: Vec::new(),
            keywords: Vec::new(),
            start_date: None,
            end_date: None,
            page,
            page_size,
            limit: None,
        })
    }

    #[must_use]
    pub fn with_locations(mut self, locations: Vec<String>) -> Self {
        self.locations = locations;
        self
    }

    #[must_use]
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDateRange`] when both bounds are present
    /// and `start > end`.
    pub fn with_date_range(
        mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, CoreError> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(CoreError::InvalidDateRange { start: s, end: e });
            }
        }
        self.start_date = start;
        self.end_date = end;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidLimit`] when `limit` is 0.
    pub fn with_limit(mut self, limit: usize) -> Result<Self, CoreError> {
        if limit < 1 {
            return Err(CoreError::InvalidLimit);
        }
        self.limit = Some(limit);
        Ok(self)
    }
}

/// One page of search results. Built once per search call; never mutated
/// after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultPage {
    pub events: Vec<EventRecord>,
    /// Best-effort total; may be a lower bound when the site does not
    /// report one.
    pub total_count: usize,
    pub page: u32,
    pub page_size: u32,
    /// Wall-clock elapsed for the whole orchestration, including retries
    /// and governor delays.
    pub search_time_ms: u64,
}
