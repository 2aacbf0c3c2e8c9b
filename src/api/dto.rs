//! API request and response DTOs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::Platform;
use crate::error::AppError;

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 200;

/// limit/offset query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Validated `(limit, offset)`
    pub fn resolve(&self) -> Result<(i64, i64), AppError> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(AppError::Validation("offset cannot be negative".to_string()));
        }
        Ok((limit, offset))
    }
}

/// Paginated listing
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        Self {
            has_more: offset + (items.len() as i64) < total,
            items,
            total,
            limit,
            offset,
        }
    }
}

/// Parse a platform path or query segment.
pub fn parse_platform(raw: &str) -> Result<Platform, AppError> {
    raw.parse()
}

pub fn parse_optional_platform(raw: Option<&str>) -> Result<Option<Platform>, AppError> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(Some(value.parse()?)),
        _ => Ok(None),
    }
}

#[derive(Debug, Deserialize)]
pub struct VideoListParams {
    pub platform: Option<String>,
    pub creator: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub is_spark_ad: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SparkAdRequest {
    pub is_spark_ad: bool,
}

/// Query accepted by every analytics endpoint
#[derive(Debug, Deserialize)]
pub struct AnalyticsParams {
    pub days: Option<u32>,
    pub metric_type: Option<String>,
    pub platform: Option<String>,
    pub collection_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AccountListParams {
    pub platform: Option<String>,
    pub collection_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub username: String,
    pub platform: String,
    pub nickname: Option<String>,
    pub profile_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatorParams {
    pub platform: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeUrlsRequest {
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ScrapeAcceptedResponse {
    pub job_id: String,
    pub status: &'static str,
    pub urls: Vec<String>,
    pub rejected: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobListParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CycleAcceptedResponse {
    pub status: &'static str,
    pub snapshot_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_bounds() {
        assert_eq!(PaginationParams::default().resolve().unwrap(), (50, 0));

        let too_big = PaginationParams {
            limit: Some(201),
            offset: None,
        };
        assert!(too_big.resolve().is_err());

        let negative = PaginationParams {
            limit: Some(10),
            offset: Some(-1),
        };
        assert!(negative.resolve().is_err());
    }

    #[test]
    fn page_reports_has_more() {
        let page = Page::new(vec![1, 2], 5, 2, 0);
        assert!(page.has_more);
        let last = Page::new(vec![5], 5, 2, 4);
        assert!(!last.has_more);
    }
}
