//! Authenticated Search Console client
//!
//! The aggregation code only sees [`SearchConsoleApi`]; the HTTP
//! implementation below is built per request from the session credentials
//! by a [`SearchConsoleConnector`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{SearchConsoleError, SearchConsoleResult};
use super::models::{AggregationType, ApiRow, Dimension, QueryRequest, Sitemap};
use crate::auth::GoogleCredentials;
use crate::config::SearchConsoleConfig;

#[async_trait]
pub trait SearchConsoleApi: Send + Sync {
    /// Runs one searchAnalytics.query page
    async fn query(&self, site_url: &str, request: &QueryRequest)
        -> SearchConsoleResult<Vec<ApiRow>>;

    /// Lists the sitemaps submitted for a property
    async fn list_sitemaps(&self, site_url: &str) -> SearchConsoleResult<Vec<Sitemap>>;
}

/// Builds an API client carrying a session's credentials
pub trait SearchConsoleConnector: Send + Sync {
    fn connect(&self, credentials: &GoogleCredentials) -> Arc<dyn SearchConsoleApi>;
}

#[derive(Clone)]
pub struct GoogleSearchConsoleClient {
    http_client: Client,
    api_base_url: Arc<str>,
    access_token: String,
}

impl GoogleSearchConsoleClient {
    pub fn new(http_client: Client, api_base_url: Arc<str>, access_token: impl Into<String>) -> Self {
        Self {
            http_client,
            api_base_url,
            access_token: access_token.into(),
        }
    }

    fn site_url(&self, site_url: &str) -> String {
        format!(
            "{}/sites/{}",
            self.api_base_url,
            urlencoding::encode(site_url)
        )
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> SearchConsoleResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SearchConsoleError::from_response(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| SearchConsoleError::InvalidResponse(e.to_string()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody<'a> {
    start_date: NaiveDate,
    end_date: NaiveDate,
    dimensions: &'a [Dimension],
    #[serde(rename = "type")]
    search_type: &'static str,
    aggregation_type: AggregationType,
    row_limit: u32,
    start_row: u32,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    rows: Vec<ApiRow>,
}

#[derive(Deserialize)]
struct SitemapsResponse {
    #[serde(default)]
    sitemap: Vec<Sitemap>,
}

#[async_trait]
impl SearchConsoleApi for GoogleSearchConsoleClient {
    async fn query(
        &self,
        site_url: &str,
        request: &QueryRequest,
    ) -> SearchConsoleResult<Vec<ApiRow>> {
        let body = QueryBody {
            start_date: request.date_range.start_date,
            end_date: request.date_range.end_date,
            dimensions: &request.dimensions,
            search_type: "web",
            aggregation_type: request.aggregation_type,
            row_limit: request.row_limit,
            start_row: request.start_row,
        };

        let response = self
            .http_client
            .post(format!("{}/searchAnalytics/query", self.site_url(site_url)))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let parsed: QueryResponse = Self::read_json(response).await?;
        debug!(
            site_url,
            start_row = request.start_row,
            rows = parsed.rows.len(),
            "searchAnalytics.query returned"
        );
        Ok(parsed.rows)
    }

    async fn list_sitemaps(&self, site_url: &str) -> SearchConsoleResult<Vec<Sitemap>> {
        let response = self
            .http_client
            .get(format!("{}/sitemaps", self.site_url(site_url)))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let parsed: SitemapsResponse = Self::read_json(response).await?;
        Ok(parsed.sitemap)
    }
}

/// Connector for the live API, sharing one HTTP connection pool
pub struct GoogleConnector {
    http_client: Client,
    api_base_url: Arc<str>,
}

impl GoogleConnector {
    pub fn from_config(config: &SearchConsoleConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let http_client = Client::builder()
            .user_agent(concat!("rankwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client for Search Console")?;

        Ok(Self {
            http_client,
            api_base_url: Arc::from(config.api_base_url.trim_end_matches('/')),
        })
    }
}

impl SearchConsoleConnector for GoogleConnector {
    fn connect(&self, credentials: &GoogleCredentials) -> Arc<dyn SearchConsoleApi> {
        Arc::new(GoogleSearchConsoleClient::new(
            self.http_client.clone(),
            Arc::clone(&self.api_base_url),
            credentials.access_token.clone(),
        ))
    }
}
