//! Search Console analytics aggregation
//!
//! Queries a property across the page, query and date dimensions for the
//! current and previous period, then joins the periods into
//! percent-change comparisons for the dashboard.

pub mod assembler;
pub mod compare;
pub mod indexing;
pub mod models;
pub mod pagination;
pub mod period;

pub use assembler::{get_site_analytics, normalize_site_url, QueryLimits};
pub use compare::{join_by_key, percent_difference};
pub use indexing::estimate_indexing_status;
pub use models::{
    GraphPoint, IndexingStatus, KeywordComparison, PageComparison, PeriodTotals,
    SiteAnalyticsSnapshot, TotalsComparison,
};
pub use pagination::{fetch_all_rows, should_fetch_next_page, MAX_PAGES};
pub use period::{AnalyticsPeriod, PeriodWindows};
