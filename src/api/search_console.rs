//! Search Console API handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use super::handlers::{error_response, ApiError, AppState};
use crate::analytics::{
    estimate_indexing_status, get_site_analytics, AnalyticsPeriod, IndexingStatus, QueryLimits,
    SiteAnalyticsSnapshot,
};
use crate::auth::require_auth;
use crate::search_console::SearchConsoleError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteQueryParams {
    /// Property identifier exactly as registered
    pub site_url: Option<String>,

    /// Comparison window preset (7d, 28d, 3mo, 6mo, 12mo, 16mo)
    pub period: Option<String>,
}

impl SiteQueryParams {
    fn site_url(&self) -> Result<&str, ApiError> {
        self.site_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                error_response(StatusCode::BAD_REQUEST, "siteUrl query parameter is required.")
            })
    }

    fn period(&self, default: AnalyticsPeriod) -> Result<AnalyticsPeriod, ApiError> {
        match self.period.as_deref() {
            None | Some("") => Ok(default),
            Some(raw) => raw
                .parse::<AnalyticsPeriod>()
                .map_err(|e| error_response(StatusCode::BAD_REQUEST, e)),
        }
    }
}

/// Map an upstream failure to its HTTP status, or 500 when it has none
fn upstream_error(site_url: &str, err: SearchConsoleError) -> ApiError {
    let status = err
        .status()
        .and_then(|s| StatusCode::from_u16(s).ok())
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    tracing::error!(site_url, status = status.as_u16(), "Search Console request failed: {}", err);
    error_response(status, err.to_string())
}

/// Period-over-period analytics for one property
pub async fn site_analytics(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<SiteQueryParams>,
) -> Result<Json<SiteAnalyticsSnapshot>, ApiError> {
    let site_url = params.site_url()?;
    let period = params.period(state.analytics.default_period)?;
    let credentials = require_auth(&jar)?;

    let client = state.connector.connect(&credentials);
    let today = chrono::Utc::now().date_naive();

    get_site_analytics(
        client.as_ref(),
        site_url,
        period.days(),
        today,
        QueryLimits::from(&state.analytics),
    )
    .await
    .map(Json)
    .map_err(|e| upstream_error(site_url, e))
}

/// Sitemap-based indexing estimate for one property
pub async fn indexing_status(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<SiteQueryParams>,
) -> Result<Json<IndexingStatus>, ApiError> {
    let site_url = params.site_url()?;
    let credentials = require_auth(&jar)?;

    let client = state.connector.connect(&credentials);
    let today = chrono::Utc::now().date_naive();

    estimate_indexing_status(
        client.as_ref(),
        site_url,
        today,
        state.analytics.indexing_lookback_days,
        state.analytics.row_limit,
    )
    .await
    .map(Json)
    .map_err(|e| upstream_error(site_url, e))
}
