//! Google Search Console API access
//!
//! Only the two endpoints the dashboard needs are wrapped:
//! `searchAnalytics.query` and `sitemaps.list`.

pub mod client;
pub mod error;
pub mod models;

pub use client::{GoogleConnector, GoogleSearchConsoleClient, SearchConsoleApi, SearchConsoleConnector};
pub use error::{SearchConsoleError, SearchConsoleResult};
pub use models::{
    AggregationType, ApiRow, DateRange, DateRow, Dimension, DimensionRow, Metrics, PageRow,
    QueryRequest, QueryRow, Sitemap, SitemapContent, MAX_ROW_LIMIT,
};
