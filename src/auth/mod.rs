pub mod oauth;
pub mod state;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::prelude::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::api::{error_response, ApiError};
use crate::config::{GoogleConfig, SessionConfig};

pub use oauth::{GoogleOAuthClient, GoogleUser, IdTokenValidator};
pub use state::{StateError, StateSigner, STATE_MAX_AGE_SECS};

pub const TOKEN_COOKIE: &str = "google_token";
pub const STATE_COOKIE: &str = "oauth_state";
const TOKEN_COOKIE_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 7;

/// OAuth credentials kept in the session cookie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoogleCredentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Access token expiry, Unix milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
}

/// Everything the auth routes need: the OAuth client, ID token checks,
/// state signing and cookie settings.
pub struct AuthService {
    pub oauth: GoogleOAuthClient,
    pub id_tokens: IdTokenValidator,
    pub state: StateSigner,
    cookie_secure: bool,
    post_login_redirect: String,
}

impl AuthService {
    pub fn new(google: &GoogleConfig, session: &SessionConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("rankwatch-oauth/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client for Google OAuth")?;

        Ok(Self {
            oauth: GoogleOAuthClient::new(google, client.clone()),
            id_tokens: IdTokenValidator::new(google, client),
            state: StateSigner::new(session.state_secret.as_deref()),
            cookie_secure: session.cookie_secure,
            post_login_redirect: session.post_login_redirect.clone(),
        })
    }

    pub fn post_login_redirect(&self) -> &str {
        &self.post_login_redirect
    }

    /// Session cookie holding the credentials as base64url JSON
    pub fn session_cookie(&self, credentials: &GoogleCredentials) -> Result<Cookie<'static>> {
        let json = serde_json::to_vec(credentials).context("failed to serialize credentials")?;
        let value = BASE64_URL_SAFE_NO_PAD.encode(json);
        Ok(self.cookie(TOKEN_COOKIE, value, TOKEN_COOKIE_MAX_AGE_SECS))
    }

    pub fn state_cookie(&self, state: String) -> Cookie<'static> {
        self.cookie(STATE_COOKIE, state, STATE_MAX_AGE_SECS)
    }

    /// Expired cookie that clears `name` in the browser
    pub fn removal_cookie(&self, name: &'static str) -> Cookie<'static> {
        self.cookie(name, String::new(), 0)
    }

    fn cookie(&self, name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build((name, value))
            .http_only(true)
            .path("/")
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .max_age(time::Duration::seconds(max_age_secs))
            .build()
    }
}

/// Reads the session credentials, rejecting with 401 when absent or unreadable
pub fn require_auth(jar: &CookieJar) -> Result<GoogleCredentials, ApiError> {
    jar.get(TOKEN_COOKIE)
        .and_then(|cookie| BASE64_URL_SAFE_NO_PAD.decode(cookie.value()).ok())
        .and_then(|json| serde_json::from_slice::<GoogleCredentials>(&json).ok())
        .filter(|credentials| !credentials.access_token.is_empty())
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "Not authenticated"))
}
