//! Response shapes for the dashboard
//!
//! Field names are camelCase to match what the front end reads.

use serde::{Deserialize, Serialize};

use crate::search_console::Sitemap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotals {
    pub total_clicks: u64,
    pub total_impressions: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsComparison {
    pub period: PeriodTotals,
    pub prev_period: PeriodTotals,
}

/// One page compared against the previous period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageComparison {
    /// Path portion of the page URL
    pub url: String,
    pub clicks: u64,
    pub prev_clicks: u64,
    pub clicks_percent: i64,
    pub impressions: u64,
    pub impressions_percent: i64,
    pub prev_impressions: u64,
}

/// One search query compared against the previous period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordComparison {
    pub keyword: String,
    pub position: f64,
    pub position_percent: i64,
    pub prev_position: f64,
    pub ctr: f64,
    pub ctr_percent: i64,
    pub prev_ctr: f64,
    pub clicks: u64,
    pub impressions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPoint {
    pub clicks: u64,
    pub impressions: u64,
    /// `YYYY-MM-DD`
    pub time: String,
}

/// Everything the dashboard shows for one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAnalyticsSnapshot {
    /// Totals summed over the page-dimension rows of each period
    pub analytics: TotalsComparison,
    pub sitemaps: Vec<Sitemap>,
    /// Estimated, not an indexing-status lookup: current-period page URLs
    /// under the property with no fragment or query string
    pub indexed_urls: Vec<String>,
    pub period: Vec<PageComparison>,
    pub keywords: Vec<KeywordComparison>,
    pub graph: Vec<GraphPoint>,
}

/// Sitemap-based indexing estimate for one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingStatus {
    /// Sitemap content entries summed across sitemaps, or a traffic-based
    /// guess when no sitemap reports any
    pub total_urls: u64,
    pub indexed_urls: u64,
    pub non_indexed_urls: u64,
    pub indexed_percent: u64,
    pub sitemaps: usize,
    /// Submitted URL counts as reported by the sitemaps
    pub submitted_urls: u64,
    /// Always true: derived from search analytics, not the URL Inspection API
    pub estimated_data: bool,
    pub normalized_site_url: String,
    pub sample_indexed_urls: Vec<String>,
}
