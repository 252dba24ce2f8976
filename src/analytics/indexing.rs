//! Indexing coverage estimate
//!
//! Search Console exposes no cheap bulk index-status call, so coverage is
//! approximated from pages that earned impressions against the content
//! entries the sitemaps report.

use chrono::{Duration, NaiveDate};
use tracing::info;

use super::assembler::{estimate_indexed_urls, normalize_site_url};
use super::models::IndexingStatus;
use super::pagination::fetch_single_page;
use crate::search_console::{
    AggregationType, DateRange, Dimension, PageRow, QueryRequest, SearchConsoleApi,
    SearchConsoleError, SearchConsoleResult, Sitemap,
};

const SAMPLE_SIZE: usize = 5;
const MIN_ESTIMATED_TOTAL: u64 = 10;

pub async fn estimate_indexing_status(
    client: &dyn SearchConsoleApi,
    site_url: &str,
    today: NaiveDate,
    lookback_days: u32,
    row_limit: u32,
) -> SearchConsoleResult<IndexingStatus> {
    let start = today
        .checked_sub_signed(Duration::days(i64::from(lookback_days)))
        .ok_or_else(|| {
            SearchConsoleError::InvalidRequest(format!(
                "lookback of {lookback_days} days reaches before the earliest representable date"
            ))
        })?;
    let range = DateRange::new(start, today);
    let request = QueryRequest::new(range, vec![Dimension::Page], row_limit)
        .with_aggregation(AggregationType::ByPage);

    let (sitemaps, pages) = tokio::try_join!(
        client.list_sitemaps(site_url),
        fetch_single_page::<PageRow>(client, site_url, &request),
    )?;

    let normalized_site_url = normalize_site_url(site_url);
    let indexed = estimate_indexed_urls(&pages, &normalized_site_url);
    let status = summarize(&sitemaps, indexed, normalized_site_url);

    info!(
        site_url,
        total_urls = status.total_urls,
        indexed_urls = status.indexed_urls,
        sitemaps = status.sitemaps,
        "indexing status estimated"
    );

    Ok(status)
}

fn summarize(sitemaps: &[Sitemap], indexed: Vec<String>, normalized_site_url: String) -> IndexingStatus {
    let indexed_count = indexed.len() as u64;

    let content_entries: u64 = sitemaps.iter().map(Sitemap::content_entries).sum();
    let total_urls = if content_entries == 0 {
        // no sitemap contents: 1.5x the pages seen in search, at least 10
        (indexed_count * 3).div_ceil(2).max(MIN_ESTIMATED_TOTAL)
    } else {
        content_entries
    };

    let indexed_percent = ((indexed_count as f64 / total_urls as f64) * 100.0).round() as u64;

    IndexingStatus {
        total_urls,
        indexed_urls: indexed_count,
        non_indexed_urls: total_urls.saturating_sub(indexed_count),
        indexed_percent: indexed_percent.min(100),
        sitemaps: sitemaps.len(),
        submitted_urls: sitemaps.iter().map(Sitemap::submitted_urls).sum(),
        estimated_data: true,
        normalized_site_url,
        sample_indexed_urls: indexed.into_iter().take(SAMPLE_SIZE).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search_console::{ApiRow, SitemapContent};
    use async_trait::async_trait;

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://site.com/{i}")).collect()
    }

    fn content(content_type: &str, submitted: &str) -> SitemapContent {
        SitemapContent {
            content_type: Some(content_type.to_string()),
            submitted: Some(submitted.to_string()),
            indexed: None,
        }
    }

    fn sitemap(contents: Vec<SitemapContent>) -> Sitemap {
        Sitemap {
            path: Some("https://site.com/sitemap.xml".to_string()),
            contents,
            ..Sitemap::default()
        }
    }

    #[test]
    fn test_content_entries_drive_the_total() {
        let sitemaps = [
            sitemap(vec![content("web", "400"), content("image", "20")]),
            sitemap(vec![content("web", "80")]),
        ];
        let status = summarize(&sitemaps, urls(1), "https://site.com".to_string());
        assert_eq!(status.total_urls, 3);
        assert_eq!(status.indexed_urls, 1);
        assert_eq!(status.non_indexed_urls, 2);
        assert_eq!(status.indexed_percent, 33);
        assert_eq!(status.sitemaps, 2);
        assert_eq!(status.submitted_urls, 500);
        assert!(status.estimated_data);
    }

    #[test]
    fn test_sample_is_limited() {
        let sitemaps = [sitemap(vec![content("web", "40")])];
        let status = summarize(&sitemaps, urls(10), "https://site.com".to_string());
        assert_eq!(status.sample_indexed_urls.len(), 5);
        assert_eq!(status.sample_indexed_urls[0], "https://site.com/0");
    }

    #[test]
    fn test_missing_sitemaps_fall_back_to_estimate() {
        let status = summarize(&[], urls(3), "https://site.com".to_string());
        assert_eq!(status.total_urls, 10);
        assert_eq!(status.indexed_percent, 30);
        assert_eq!(status.submitted_urls, 0);

        let status = summarize(&[], urls(21), "https://site.com".to_string());
        assert_eq!(status.total_urls, 32);
        assert_eq!(status.non_indexed_urls, 11);
    }

    #[test]
    fn test_sitemaps_without_contents_fall_back_to_estimate() {
        let status = summarize(&[sitemap(Vec::new())], urls(4), "https://site.com".to_string());
        assert_eq!(status.total_urls, 10);
        assert_eq!(status.sitemaps, 1);
    }

    #[test]
    fn test_percent_is_capped_when_traffic_exceeds_entries() {
        let sitemaps = [sitemap(vec![content("web", "2")])];
        let status = summarize(&sitemaps, urls(5), "https://site.com".to_string());
        assert_eq!(status.indexed_percent, 100);
        assert_eq!(status.non_indexed_urls, 0);
    }

    struct NoTraffic;

    #[async_trait]
    impl SearchConsoleApi for NoTraffic {
        async fn query(&self, _: &str, _: &QueryRequest) -> SearchConsoleResult<Vec<ApiRow>> {
            Ok(Vec::new())
        }

        async fn list_sitemaps(&self, _: &str) -> SearchConsoleResult<Vec<Sitemap>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_out_of_range_lookback_is_an_error() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let err = estimate_indexing_status(&NoTraffic, "https://site.com/", today, 200_000_000, 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchConsoleError::InvalidRequest(_)));
        assert_eq!(err.status(), None);
    }
}
