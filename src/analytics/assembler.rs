//! Builds the per-site analytics snapshot
//!
//! Six independent upstream calls are joined fail-fast: the first error
//! aborts the batch and nothing partial is returned.

use chrono::NaiveDate;
use tracing::info;

use super::compare::{join_by_key, percent_difference};
use super::models::{
    GraphPoint, KeywordComparison, PageComparison, PeriodTotals, SiteAnalyticsSnapshot,
    TotalsComparison,
};
use super::pagination::{fetch_all_rows, fetch_single_page};
use super::period::PeriodWindows;
use crate::config::AnalyticsConfig;
use crate::search_console::{
    DateRange, DateRow, Dimension, DimensionRow, PageRow, QueryRequest, QueryRow,
    SearchConsoleApi, SearchConsoleResult,
};

const DOMAIN_PROPERTY_PREFIX: &str = "sc-domain:";

/// Per-call and total row bounds for upstream queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub row_limit: u32,
    pub max_rows: usize,
}

impl From<&AnalyticsConfig> for QueryLimits {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            row_limit: config.row_limit,
            max_rows: config.max_rows,
        }
    }
}

/// Collects the snapshot for `site_url` comparing the last `period_days`
/// against the `period_days` before them.
pub async fn get_site_analytics(
    client: &dyn SearchConsoleApi,
    site_url: &str,
    period_days: u32,
    today: NaiveDate,
    limits: QueryLimits,
) -> SearchConsoleResult<SiteAnalyticsSnapshot> {
    let windows = PeriodWindows::ending(today, period_days);
    let request = |range: DateRange, dimension: Dimension| {
        QueryRequest::new(range, vec![dimension], limits.row_limit)
    };

    let current_pages_request = request(windows.current, Dimension::Page);
    let previous_pages_request = request(windows.previous, Dimension::Page);
    let current_keywords_request = request(windows.current, Dimension::Query);
    let previous_keywords_request = request(windows.previous, Dimension::Query);
    let graph_request = request(windows.graph, Dimension::Date);

    let (current_pages, previous_pages, current_keywords, previous_keywords, graph_rows, sitemaps) = tokio::try_join!(
        fetch_all_rows::<PageRow>(client, site_url, &current_pages_request, limits.max_rows),
        fetch_single_page::<PageRow>(client, site_url, &previous_pages_request),
        fetch_all_rows::<QueryRow>(client, site_url, &current_keywords_request, limits.max_rows),
        fetch_single_page::<QueryRow>(client, site_url, &previous_keywords_request),
        fetch_single_page::<DateRow>(client, site_url, &graph_request),
        client.list_sitemaps(site_url),
    )?;

    let normalized_site_url = normalize_site_url(site_url);
    let indexed_urls = estimate_indexed_urls(&current_pages, &normalized_site_url);

    let snapshot = SiteAnalyticsSnapshot {
        analytics: TotalsComparison {
            period: sum_totals(&current_pages),
            prev_period: sum_totals(&previous_pages),
        },
        sitemaps,
        indexed_urls,
        period: compare_pages(&current_pages, &previous_pages),
        keywords: compare_keywords(&current_keywords, &previous_keywords),
        graph: build_graph(&graph_rows),
    };

    info!(
        site_url,
        period_days,
        pages = snapshot.period.len(),
        keywords = snapshot.keywords.len(),
        graph_points = snapshot.graph.len(),
        "site analytics assembled"
    );

    Ok(snapshot)
}

/// Rewrites a domain property (`sc-domain:example.com`) to `https://example.com`
/// and drops one trailing slash, giving a prefix to match page URLs against.
pub fn normalize_site_url(site_url: &str) -> String {
    let rewritten = match site_url.strip_prefix(DOMAIN_PROPERTY_PREFIX) {
        Some(domain) => format!("https://{domain}"),
        None => site_url.to_string(),
    };

    match rewritten.strip_suffix('/') {
        Some(trimmed) => trimmed.to_string(),
        None => rewritten,
    }
}

/// Heuristic stand-in for index coverage: page URLs that received search
/// traffic, have no fragment or query string, and sit under the property.
pub fn estimate_indexed_urls(pages: &[PageRow], normalized_site_url: &str) -> Vec<String> {
    pages
        .iter()
        .map(|row| row.url.as_str())
        .filter(|url| !url.contains('#') && !url.contains('?') && url.starts_with(normalized_site_url))
        .map(str::to_string)
        .collect()
}

/// Path-only form of a page URL for display. Unparseable input is returned as-is.
pub fn display_path(page_url: &str) -> String {
    match url::Url::parse(page_url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => page_url.to_string(),
    }
}

pub fn sum_totals<R: DimensionRow>(rows: &[R]) -> PeriodTotals {
    rows.iter().fold(PeriodTotals::default(), |mut totals, row| {
        totals.total_clicks += row.metrics().clicks;
        totals.total_impressions += row.metrics().impressions;
        totals
    })
}

pub fn compare_pages(current: &[PageRow], previous: &[PageRow]) -> Vec<PageComparison> {
    join_by_key(current, previous, |row| row.url.as_str())
        .into_iter()
        .map(|(row, prev)| {
            let prev_clicks = prev.map_or(0, |p| p.metrics.clicks);
            let prev_impressions = prev.map_or(0, |p| p.metrics.impressions);

            PageComparison {
                url: display_path(&row.url),
                clicks: row.metrics.clicks,
                prev_clicks,
                clicks_percent: percent_difference(row.metrics.clicks as f64, prev_clicks as f64),
                impressions: row.metrics.impressions,
                impressions_percent: percent_difference(
                    row.metrics.impressions as f64,
                    prev_impressions as f64,
                ),
                prev_impressions,
            }
        })
        .collect()
}

pub fn compare_keywords(current: &[QueryRow], previous: &[QueryRow]) -> Vec<KeywordComparison> {
    join_by_key(current, previous, |row| row.query.as_str())
        .into_iter()
        .map(|(row, prev)| {
            let prev_position = prev.map_or(0.0, |p| p.metrics.position);
            let prev_ctr = prev.map_or(0.0, |p| p.metrics.ctr);

            KeywordComparison {
                keyword: row.query.clone(),
                position: row.metrics.position,
                position_percent: percent_difference(row.metrics.position, prev_position),
                prev_position,
                ctr: row.metrics.ctr,
                ctr_percent: percent_difference(row.metrics.ctr, prev_ctr),
                prev_ctr,
                clicks: row.metrics.clicks,
                impressions: row.metrics.impressions,
            }
        })
        .collect()
}

/// Daily series in the order the API returned it
pub fn build_graph(rows: &[DateRow]) -> Vec<GraphPoint> {
    rows.iter()
        .map(|row| GraphPoint {
            clicks: row.metrics.clicks,
            impressions: row.metrics.impressions,
            time: row.date.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search_console::ApiRow;

    fn page(url: &str, clicks: u64, impressions: u64) -> PageRow {
        PageRow::from_api(ApiRow::new(url, clicks, impressions)).unwrap()
    }

    fn keyword(query: &str, clicks: u64, impressions: u64, position: f64) -> QueryRow {
        QueryRow::from_api(ApiRow::new(query, clicks, impressions).with_position(position)).unwrap()
    }

    #[test]
    fn test_domain_properties_normalize_to_https() {
        assert_eq!(normalize_site_url("sc-domain:example.com"), "https://example.com");
        assert_eq!(normalize_site_url("https://example.com/"), "https://example.com");
        assert_eq!(normalize_site_url("http://example.com/blog/"), "http://example.com/blog");
        assert_eq!(normalize_site_url("https://example.com"), "https://example.com");
    }

    #[test]
    fn test_indexed_urls_exclude_fragments_queries_and_other_hosts() {
        let rows = vec![
            page("https://site.com/a", 1, 1),
            page("https://site.com/a#frag", 1, 1),
            page("https://site.com/b?x=1", 1, 1),
            page("https://other.com/a", 1, 1),
        ];
        assert_eq!(
            estimate_indexed_urls(&rows, "https://site.com"),
            vec!["https://site.com/a".to_string()]
        );
    }

    #[test]
    fn test_display_path_strips_origin() {
        assert_eq!(display_path("https://site.com/blog/post?x=1"), "/blog/post");
        assert_eq!(display_path("https://site.com"), "/");
        assert_eq!(display_path("not a url"), "not a url");
    }

    #[test]
    fn test_page_comparison_defaults_missing_previous_to_zero() {
        let current = vec![page("https://site.com/new", 5, 50), page("https://site.com/old", 150, 400)];
        let previous = vec![page("https://site.com/old", 100, 800), page("https://site.com/gone", 9, 9)];

        let compared = compare_pages(&current, &previous);
        assert_eq!(compared.len(), 2);

        assert_eq!(compared[0].url, "/new");
        assert_eq!(compared[0].prev_clicks, 0);
        assert_eq!(compared[0].clicks_percent, 100);
        assert_eq!(compared[0].impressions_percent, 100);

        assert_eq!(compared[1].url, "/old");
        assert_eq!(compared[1].prev_clicks, 100);
        assert_eq!(compared[1].clicks_percent, 50);
        assert_eq!(compared[1].prev_impressions, 800);
        assert_eq!(compared[1].impressions_percent, -50);
    }

    #[test]
    fn test_keyword_comparison_carries_position_and_ctr() {
        let current = vec![keyword("rust", 10, 100, 3.0)];
        let previous = vec![keyword("rust", 5, 100, 6.0)];

        let compared = compare_keywords(&current, &previous);
        assert_eq!(compared.len(), 1);
        let rust = &compared[0];
        assert_eq!(rust.keyword, "rust");
        assert_eq!(rust.position, 3.0);
        assert_eq!(rust.prev_position, 6.0);
        assert_eq!(rust.position_percent, -50);
        assert!((rust.ctr - 0.1).abs() < f64::EPSILON);
        assert!((rust.prev_ctr - 0.05).abs() < f64::EPSILON);
        assert_eq!(rust.ctr_percent, 100);
    }

    #[test]
    fn test_totals_sum_clicks_and_impressions() {
        let rows = vec![page("https://a.com/1", 3, 10), page("https://a.com/2", 4, 20)];
        assert_eq!(
            sum_totals(&rows),
            PeriodTotals {
                total_clicks: 7,
                total_impressions: 30
            }
        );
        assert_eq!(sum_totals::<PageRow>(&[]), PeriodTotals::default());
    }
}
