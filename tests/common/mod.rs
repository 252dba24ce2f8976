//! Shared fixtures for integration tests: an in-memory Search Console and
//! helpers for building the API router without network access.

#![allow(dead_code)]

use async_trait::async_trait;
use rankwatch::api::AppState;
use rankwatch::auth::{AuthService, GoogleCredentials};
use rankwatch::config::{AnalyticsConfig, GoogleConfig, SessionConfig};
use rankwatch::search_console::{
    ApiRow, QueryRequest, SearchConsoleApi, SearchConsoleConnector, SearchConsoleResult, Sitemap,
};
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&QueryRequest) -> SearchConsoleResult<Vec<ApiRow>> + Send + Sync;
type SitemapResponder = dyn Fn() -> SearchConsoleResult<Vec<Sitemap>> + Send + Sync;

/// Search Console double that answers queries from a closure and records
/// every request it sees
pub struct MockSearchConsole {
    responder: Box<Responder>,
    sitemaps: Box<SitemapResponder>,
    calls: Mutex<Vec<QueryRequest>>,
}

impl MockSearchConsole {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&QueryRequest) -> SearchConsoleResult<Vec<ApiRow>> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            sitemaps: Box::new(|| Ok(Vec::new())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_sitemaps<F>(mut self, sitemaps: F) -> Self
    where
        F: Fn() -> SearchConsoleResult<Vec<Sitemap>> + Send + Sync + 'static,
    {
        self.sitemaps = Box::new(sitemaps);
        self
    }

    pub fn calls(&self) -> Vec<QueryRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchConsoleApi for MockSearchConsole {
    async fn query(
        &self,
        _site_url: &str,
        request: &QueryRequest,
    ) -> SearchConsoleResult<Vec<ApiRow>> {
        self.calls.lock().unwrap().push(request.clone());
        (self.responder)(request)
    }

    async fn list_sitemaps(&self, _site_url: &str) -> SearchConsoleResult<Vec<Sitemap>> {
        (self.sitemaps)()
    }
}

/// Hands out the same mock for every session and remembers the tokens used
pub struct MockConnector {
    pub api: Arc<MockSearchConsole>,
    pub tokens: Mutex<Vec<String>>,
}

impl MockConnector {
    pub fn new(api: MockSearchConsole) -> Self {
        Self {
            api: Arc::new(api),
            tokens: Mutex::new(Vec::new()),
        }
    }
}

impl SearchConsoleConnector for MockConnector {
    fn connect(&self, credentials: &GoogleCredentials) -> Arc<dyn SearchConsoleApi> {
        self.tokens
            .lock()
            .unwrap()
            .push(credentials.access_token.clone());
        self.api.clone()
    }
}

/// `count` page rows named `{prefix}{n}` with one click each
pub fn rows(prefix: &str, count: usize) -> Vec<ApiRow> {
    (0..count)
        .map(|n| ApiRow::new(format!("{prefix}{n}"), 1, 10))
        .collect()
}

pub fn google_config() -> GoogleConfig {
    GoogleConfig {
        client_id: "test-client.apps.googleusercontent.com".to_string(),
        client_secret: "test-secret".to_string(),
        redirect_uri: "http://localhost:8080/api/auth/callback".to_string(),
        jwks_url: Some("http://127.0.0.1:9/jwks".to_string()),
        jwks_cache_ttl_secs: 3600,
    }
}

pub fn session_config() -> SessionConfig {
    SessionConfig {
        cookie_secure: false,
        state_secret: Some("integration-test-secret".to_string()),
        post_login_redirect: "/app/dashboard".to_string(),
    }
}

pub fn create_test_auth_service() -> Arc<AuthService> {
    Arc::new(AuthService::new(&google_config(), &session_config()).unwrap())
}

pub fn create_test_state(connector: Arc<MockConnector>) -> Arc<AppState> {
    Arc::new(AppState {
        connector,
        auth: create_test_auth_service(),
        analytics: AnalyticsConfig {
            row_limit: 100,
            max_rows: 1000,
            ..AnalyticsConfig::default()
        },
    })
}

/// `Cookie` header value for a signed-in session
pub fn session_cookie_header(auth: &AuthService, access_token: &str) -> String {
    let credentials = GoogleCredentials {
        access_token: access_token.to_string(),
        refresh_token: Some("1//refresh".to_string()),
        id_token: None,
        scope: None,
        token_type: Some("Bearer".to_string()),
        expiry_date: None,
    };
    let cookie = auth.session_cookie(&credentials).unwrap();
    format!("{}={}", cookie.name(), cookie.value())
}
