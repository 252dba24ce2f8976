use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Context, Result};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::GoogleCredentials;
use crate::config::GoogleConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";
const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];

pub const SCOPES: [&str; 4] = [
    "openid",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/webmasters.readonly",
    "https://www.googleapis.com/auth/indexing",
];

/// Authorization-code flow against Google's OAuth endpoints
#[derive(Clone)]
pub struct GoogleOAuthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    client: Client,
}

impl GoogleOAuthClient {
    pub fn new(config: &GoogleConfig, client: Client) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            client,
        }
    }

    /// Consent page URL requesting offline access
    pub fn authorization_url(&self, state: &str) -> Result<String> {
        let scope = SCOPES.join(" ");
        let url = url::Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )
        .context("failed to build Google authorization URL")?;

        Ok(url.into())
    }

    /// Exchanges an authorization code for credentials
    pub async fn exchange_code(&self, code: &str, now_ms: i64) -> Result<GoogleCredentials> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .context("token exchange request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read token response")?;

        if !status.is_success() {
            bail!("token exchange failed ({}): {}", status, token_error_message(&body));
        }

        let token: TokenResponse =
            serde_json::from_str(&body).context("failed to parse token response")?;

        info!("exchanged authorization code for tokens");
        Ok(token.into_credentials(now_ms))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

impl TokenResponse {
    fn into_credentials(self, now_ms: i64) -> GoogleCredentials {
        GoogleCredentials {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            id_token: self.id_token,
            scope: self.scope,
            token_type: self.token_type,
            expiry_date: self.expires_in.map(|secs| now_ms + secs * 1000),
        }
    }
}

fn token_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct TokenError {
        error: String,
        #[serde(default)]
        error_description: Option<String>,
    }

    match serde_json::from_str::<TokenError>(body) {
        Ok(err) => match err.error_description {
            Some(description) => format!("{}: {}", err.error, description),
            None => err.error,
        },
        Err(_) => body.to_string(),
    }
}

/// Profile fields read from a verified ID token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoogleUser {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Verifies Google ID tokens against the published JWKS.
///
/// Keys are fetched on first use and refreshed when the TTL lapses or an
/// unknown `kid` shows up.
#[derive(Clone)]
pub struct IdTokenValidator {
    audience: String,
    jwks_url: Option<String>,
    client: Client,
    keys: Arc<RwLock<HashMap<String, Arc<DecodingKey>>>>,
    last_refresh: Arc<RwLock<Option<Instant>>>,
    cache_ttl: Duration,
}

impl IdTokenValidator {
    pub fn new(config: &GoogleConfig, client: Client) -> Self {
        Self {
            audience: config.client_id.clone(),
            jwks_url: config.jwks_url.clone(),
            client,
            keys: Arc::new(RwLock::new(HashMap::new())),
            last_refresh: Arc::new(RwLock::new(None)),
            cache_ttl: Duration::from_secs(config.jwks_cache_ttl_secs.max(60)),
        }
    }

    pub async fn validate(&self, token: &str) -> Result<GoogleUser> {
        let header = decode_header(token).context("failed to parse token header")?;
        if !matches!(header.alg, Algorithm::RS256) {
            bail!("unexpected ID token algorithm {:?}", header.alg);
        }

        let kid = header
            .kid
            .ok_or_else(|| anyhow!("token header missing 'kid'"))?;

        let key = self.get_decoding_key(&kid).await?;

        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let data = decode::<GoogleUser>(token, key.as_ref(), &validation)
            .context("token failed signature or claim validation")?;

        Ok(data.claims)
    }

    async fn get_decoding_key(&self, kid: &str) -> Result<Arc<DecodingKey>> {
        self.ensure_fresh_keys(kid).await?;

        let keys_guard = self.keys.read().await;
        keys_guard
            .get(kid)
            .cloned()
            .ok_or_else(|| anyhow!("no JWKS entry found for key id '{kid}'"))
    }

    async fn ensure_fresh_keys(&self, kid: &str) -> Result<()> {
        let expired = {
            let last_guard = self.last_refresh.read().await;
            match *last_guard {
                Some(last) => last.elapsed() > self.cache_ttl,
                None => true,
            }
        };

        if expired {
            debug!("Refreshing Google JWKS cache due to expiration");
            return self.refresh_keys().await;
        }

        let missing = !self.keys.read().await.contains_key(kid);
        if missing {
            debug!("Refreshing Google JWKS cache because key {kid} was missing");
            self.refresh_keys().await?;
        }

        Ok(())
    }

    async fn refresh_keys(&self) -> Result<()> {
        let jwks_uri = self.resolve_jwks_uri().await?;
        let jwks: JwkSet = self
            .client
            .get(&jwks_uri)
            .send()
            .await
            .context("failed to request JWKS")?
            .error_for_status()
            .context("JWKS endpoint returned an error status")?
            .json()
            .await
            .context("failed to parse JWKS response")?;

        let new_keys = decoding_keys(jwks)?;

        *self.keys.write().await = new_keys;
        *self.last_refresh.write().await = Some(Instant::now());

        Ok(())
    }

    async fn resolve_jwks_uri(&self) -> Result<String> {
        if let Some(url) = &self.jwks_url {
            return Ok(url.clone());
        }

        let metadata: OpenIdProviderMetadata = self
            .client
            .get(GOOGLE_DISCOVERY_URL)
            .send()
            .await
            .context("failed to request OpenID provider metadata")?
            .error_for_status()
            .context("OpenID provider metadata endpoint returned an error status")?
            .json()
            .await
            .context("failed to parse OpenID provider metadata")?;

        metadata
            .jwks_uri
            .ok_or_else(|| anyhow!("OpenID provider metadata did not include 'jwks_uri'"))
    }
}

fn decoding_keys(jwks: JwkSet) -> Result<HashMap<String, Arc<DecodingKey>>> {
    let mut keys = HashMap::new();

    for jwk in jwks.keys {
        let Some(kid) = jwk.kid else {
            warn!("Skipping JWKS entry without 'kid'");
            continue;
        };

        if jwk.kty != "RSA" {
            warn!("Skipping unsupported JWKS key type: {}", jwk.kty);
            continue;
        }

        let n = jwk
            .n
            .as_deref()
            .ok_or_else(|| anyhow!("JWKS RSA key missing modulus"))?;
        let e = jwk
            .e
            .as_deref()
            .ok_or_else(|| anyhow!("JWKS RSA key missing exponent"))?;
        let key = DecodingKey::from_rsa_components(n, e)
            .context("failed to build RSA decoding key from JWKS entry")?;
        keys.insert(kid, Arc::new(key));
    }

    if keys.is_empty() {
        bail!("JWKS response did not contain any usable keys");
    }

    Ok(keys)
}

#[derive(Debug, Deserialize)]
struct OpenIdProviderMetadata {
    jwks_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: Option<String>,
    #[serde(default)]
    kty: String,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}
