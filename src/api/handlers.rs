use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::{require_auth, AuthService, GoogleUser, STATE_COOKIE, TOKEN_COOKIE};
use crate::config::AnalyticsConfig;
use crate::search_console::SearchConsoleConnector;

pub struct AppState {
    pub connector: Arc<dyn SearchConsoleConnector>,
    pub auth: Arc<AuthService>,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Start the Google consent flow
pub async fn google_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let now = chrono::Utc::now().timestamp();
    let oauth_state = state.auth.state.issue(now).map_err(|e| {
        error!("Failed to issue OAuth state: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to start login")
    })?;

    let url = state.auth.oauth.authorization_url(&oauth_state).map_err(|e| {
        error!("Failed to build authorization URL: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to start login")
    })?;

    let jar = jar.add(state.auth.state_cookie(oauth_state));
    Ok((jar, Redirect::temporary(&url)))
}

/// Google redirects here with an authorization code
pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Missing code"))?;

    verify_callback_state(&state.auth, &jar, params.state.as_deref())?;

    let now_ms = chrono::Utc::now().timestamp_millis();
    let credentials = state
        .auth
        .oauth
        .exchange_code(&code, now_ms)
        .await
        .map_err(|e| {
            error!("OAuth code exchange failed: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    let session = state.auth.session_cookie(&credentials).map_err(|e| {
        error!("Failed to build session cookie: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "OAuth2 error")
    })?;

    info!("User signed in with Google");
    let jar = jar
        .add(state.auth.removal_cookie(STATE_COOKIE))
        .add(session);
    Ok((jar, Redirect::temporary(state.auth.post_login_redirect())))
}

fn verify_callback_state(
    auth: &AuthService,
    jar: &CookieJar,
    returned: Option<&str>,
) -> Result<(), ApiError> {
    let invalid = || error_response(StatusCode::BAD_REQUEST, "Invalid OAuth state");

    let returned = returned.ok_or_else(invalid)?;
    let expected = jar.get(STATE_COOKIE).ok_or_else(invalid)?;
    if expected.value() != returned {
        warn!("OAuth state does not match the state cookie");
        return Err(invalid());
    }

    auth.state
        .verify(returned, chrono::Utc::now().timestamp())
        .map_err(|e| {
            warn!("Rejected OAuth state: {}", e);
            invalid()
        })
}

/// Clear the session cookie
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    let jar = jar.add(state.auth.removal_cookie(TOKEN_COOKIE));
    (
        jar,
        Json(SuccessResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// Profile of the signed-in user, read from the stored ID token
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<GoogleUser>, ApiError> {
    let credentials = require_auth(&jar)?;
    let failed = || error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get user info");

    let id_token = credentials.id_token.as_deref().ok_or_else(|| {
        warn!("Session has no ID token");
        failed()
    })?;

    match state.auth.id_tokens.validate(id_token).await {
        Ok(user) => Ok(Json(user)),
        Err(e) => {
            error!("Error getting user info: {:#}", e);
            Err(failed())
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
