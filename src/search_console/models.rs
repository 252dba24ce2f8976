//! Search Console request and row types
//!
//! Raw API rows carry their dimension values in an untyped `keys` array.
//! They are converted at the client boundary into one row type per
//! dimension so the aggregation code never indexes into `keys`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{SearchConsoleError, SearchConsoleResult};

/// Largest `rowLimit` the searchAnalytics.query endpoint accepts
pub const MAX_ROW_LIMIT: u32 = 25_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Date,
    Query,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationType {
    #[default]
    Auto,
    ByPage,
    ByProperty,
}

/// Inclusive date range, serialized as `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }
}

/// One searchAnalytics.query call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub date_range: DateRange,
    pub dimensions: Vec<Dimension>,
    pub aggregation_type: AggregationType,
    pub row_limit: u32,
    pub start_row: u32,
}

impl QueryRequest {
    /// Builds a request starting at row 0. `row_limit` is clamped to `1..=MAX_ROW_LIMIT`.
    pub fn new(date_range: DateRange, dimensions: Vec<Dimension>, row_limit: u32) -> Self {
        Self {
            date_range,
            dimensions,
            aggregation_type: AggregationType::Auto,
            row_limit: row_limit.clamp(1, MAX_ROW_LIMIT),
            start_row: 0,
        }
    }

    pub fn with_aggregation(mut self, aggregation_type: AggregationType) -> Self {
        self.aggregation_type = aggregation_type;
        self
    }

    /// The same request advanced to the next page
    pub fn next_page(&self) -> Self {
        Self {
            start_row: self.start_row + self.row_limit,
            ..self.clone()
        }
    }
}

/// A row as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiRow {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
}

impl ApiRow {
    pub fn new(key: impl Into<String>, clicks: u64, impressions: u64) -> Self {
        let ctr = if impressions > 0 {
            clicks as f64 / impressions as f64
        } else {
            0.0
        };
        Self {
            keys: vec![key.into()],
            clicks: clicks as f64,
            impressions: impressions as f64,
            ctr,
            position: 0.0,
        }
    }

    pub fn with_position(mut self, position: f64) -> Self {
        self.position = position;
        self
    }

    fn first_key(&self, dimension: Dimension) -> SearchConsoleResult<&str> {
        self.keys.first().map(String::as_str).ok_or_else(|| {
            SearchConsoleError::InvalidResponse(format!(
                "row is missing its {dimension:?} key"
            ))
        })
    }

    fn metrics(&self) -> Metrics {
        Metrics {
            clicks: to_count(self.clicks),
            impressions: to_count(self.impressions),
            ctr: self.ctr,
            position: self.position,
        }
    }
}

fn to_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub clicks: u64,
    pub impressions: u64,
    /// Click-through rate, 0..=1
    pub ctr: f64,
    /// Average ranking position, lower is better
    pub position: f64,
}

/// A typed row for a single-dimension query
pub trait DimensionRow: Sized + Send {
    const DIMENSION: Dimension;

    fn from_api(row: ApiRow) -> SearchConsoleResult<Self>;

    fn metrics(&self) -> &Metrics;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRow {
    pub url: String,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRow {
    pub query: String,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRow {
    /// `YYYY-MM-DD`, as sent by the API
    pub date: String,
    pub metrics: Metrics,
}

impl DimensionRow for PageRow {
    const DIMENSION: Dimension = Dimension::Page;

    fn from_api(row: ApiRow) -> SearchConsoleResult<Self> {
        Ok(Self {
            url: row.first_key(Self::DIMENSION)?.to_string(),
            metrics: row.metrics(),
        })
    }

    fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

impl DimensionRow for QueryRow {
    const DIMENSION: Dimension = Dimension::Query;

    fn from_api(row: ApiRow) -> SearchConsoleResult<Self> {
        Ok(Self {
            query: row.first_key(Self::DIMENSION)?.to_string(),
            metrics: row.metrics(),
        })
    }

    fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

impl DimensionRow for DateRow {
    const DIMENSION: Dimension = Dimension::Date;

    fn from_api(row: ApiRow) -> SearchConsoleResult<Self> {
        Ok(Self {
            date: row.first_key(Self::DIMENSION)?.to_string(),
            metrics: row.metrics(),
        })
    }

    fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// A sitemap entry from sitemaps.list
///
/// Counts are int64 in the API and arrive as JSON strings; they are passed
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sitemap {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_submitted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_downloaded: Option<String>,
    #[serde(default)]
    pub is_pending: bool,
    #[serde(default)]
    pub is_sitemaps_index: bool,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub sitemap_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
    #[serde(default)]
    pub contents: Vec<SitemapContent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapContent {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<String>,
}

impl Sitemap {
    /// Number of content-type entries (web, image, video, ...) reported
    pub fn content_entries(&self) -> u64 {
        self.contents.len() as u64
    }

    /// Sum of the submitted counts across content types
    pub fn submitted_urls(&self) -> u64 {
        self.contents
            .iter()
            .filter_map(|c| c.submitted.as_deref())
            .filter_map(|s| s.parse::<u64>().ok())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_limit_is_clamped_to_api_maximum() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 28).unwrap(),
        );
        let request = QueryRequest::new(range, vec![Dimension::Page], 100_000);
        assert_eq!(request.row_limit, MAX_ROW_LIMIT);

        let request = QueryRequest::new(range, vec![Dimension::Page], 0);
        assert_eq!(request.row_limit, 1);
    }

    #[test]
    fn test_next_page_advances_by_row_limit() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 28).unwrap(),
        );
        let first = QueryRequest::new(range, vec![Dimension::Query], 500);
        let third = first.next_page().next_page();
        assert_eq!(third.start_row, 1000);
        assert_eq!(third.row_limit, 500);
        assert_eq!(third.dimensions, vec![Dimension::Query]);
    }

    #[test]
    fn test_api_rows_deserialize_with_missing_metrics() {
        let row: ApiRow = serde_json::from_str(r#"{"keys":["https://a.com/"],"clicks":3}"#).unwrap();
        let page = PageRow::from_api(row).unwrap();
        assert_eq!(page.url, "https://a.com/");
        assert_eq!(page.metrics.clicks, 3);
        assert_eq!(page.metrics.impressions, 0);
    }

    #[test]
    fn test_rows_without_keys_are_rejected() {
        let err = QueryRow::from_api(ApiRow::default()).unwrap_err();
        assert!(matches!(err, SearchConsoleError::InvalidResponse(_)));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_sitemap_counts_parse_from_strings() {
        let sitemap: Sitemap = serde_json::from_str(
            r#"{"path":"https://a.com/sitemap.xml","contents":[
                {"type":"web","submitted":"12","indexed":"0"},
                {"type":"image","submitted":"3"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(sitemap.submitted_urls(), 15);
        assert_eq!(sitemap.content_entries(), 2);
    }

    #[test]
    fn test_dimensions_serialize_lowercase() {
        let json = serde_json::to_string(&vec![Dimension::Date, Dimension::Page]).unwrap();
        assert_eq!(json, r#"["date","page"]"#);
        let agg = serde_json::to_string(&AggregationType::ByPage).unwrap();
        assert_eq!(agg, r#""byPage""#);
    }
}
