//! Paginated searchAnalytics.query
//!
//! Pages are fetched strictly in order: each request's `startRow` depends on
//! the previous page having come back full.

use tracing::debug;

use crate::search_console::{DimensionRow, QueryRequest, SearchConsoleApi, SearchConsoleResult};

/// Hard cap on pages fetched for a single query
pub const MAX_PAGES: usize = 4;

/// Whether another page should be requested after one came back.
///
/// Only a full page means more rows may exist. Reaching `max_rows` or
/// [`MAX_PAGES`] truncates the result instead of erroring.
pub fn should_fetch_next_page(
    page_len: usize,
    row_limit: usize,
    accumulated: usize,
    max_rows: usize,
    pages_fetched: usize,
) -> bool {
    page_len == row_limit && accumulated < max_rows && pages_fetched < MAX_PAGES
}

/// Fetches every page of `request` up to `max_rows` rows.
///
/// The request must carry exactly the row type's dimension. Any failure
/// discards the rows gathered so far.
pub async fn fetch_all_rows<R: DimensionRow>(
    client: &dyn SearchConsoleApi,
    site_url: &str,
    request: &QueryRequest,
    max_rows: usize,
) -> SearchConsoleResult<Vec<R>> {
    let mut rows: Vec<R> = Vec::new();
    let mut page_request = request.clone();
    let mut pages_fetched = 0;

    loop {
        let page = client.query(site_url, &page_request).await?;
        pages_fetched += 1;

        let page_len = page.len();
        for row in page {
            rows.push(R::from_api(row)?);
        }

        if !should_fetch_next_page(
            page_len,
            page_request.row_limit as usize,
            rows.len(),
            max_rows,
            pages_fetched,
        ) {
            break;
        }
        page_request = page_request.next_page();
    }

    rows.truncate(max_rows);
    debug!(
        site_url,
        dimension = ?R::DIMENSION,
        pages = pages_fetched,
        rows = rows.len(),
        "paginated query complete"
    );
    Ok(rows)
}

/// Fetches one page and converts it, accepting truncation
pub async fn fetch_single_page<R: DimensionRow>(
    client: &dyn SearchConsoleApi,
    site_url: &str,
    request: &QueryRequest,
) -> SearchConsoleResult<Vec<R>> {
    client
        .query(site_url, request)
        .await?
        .into_iter()
        .map(R::from_api)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_page_means_exhausted() {
        assert!(!should_fetch_next_page(7, 10, 7, 1000, 1));
        assert!(!should_fetch_next_page(0, 10, 0, 1000, 1));
    }

    #[test]
    fn test_full_page_continues_below_ceilings() {
        assert!(should_fetch_next_page(10, 10, 10, 1000, 1));
        assert!(should_fetch_next_page(10, 10, 30, 1000, 3));
    }

    #[test]
    fn test_ceilings_stop_pagination() {
        assert!(!should_fetch_next_page(10, 10, 1000, 1000, 2));
        assert!(!should_fetch_next_page(10, 10, 40, 1000, MAX_PAGES));
    }
}
