use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchConsoleError {
    /// Non-2xx response from the API
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Search Console request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected Search Console response: {0}")]
    InvalidResponse(String),
    /// Request could not be built from the given parameters
    #[error("invalid Search Console request: {0}")]
    InvalidRequest(String),
}

pub type SearchConsoleResult<T> = Result<T, SearchConsoleError>;

impl SearchConsoleError {
    /// Upstream HTTP status, when the failure carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            Self::InvalidResponse(_) | Self::InvalidRequest(_) => None,
        }
    }

    /// Builds an `Api` error from a failed response body, preferring the
    /// message inside Google's `{"error": {...}}` envelope.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("Search Console API returned status {status}")
                } else {
                    body.trim().to_string()
                }
            });

        Self::Api { status, message }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}
