use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rankwatch::api::{self, AppState};
use rankwatch::auth::AuthService;
use rankwatch::config::Config;
use rankwatch::search_console::GoogleConnector;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rankwatch=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    let connector = Arc::new(GoogleConnector::from_config(&config.search_console)?);
    info!(
        "Search Console API: {} (timeout {}s)",
        config.search_console.api_base_url, config.search_console.timeout_secs
    );

    let auth_service = Arc::new(AuthService::new(&config.google, &config.session)?);
    if config.session.state_secret.is_none() {
        info!("OAUTH_STATE_SECRET not set, using a random key; logins in flight will not survive a restart");
    }

    info!(
        "Analytics defaults: period {}, {} rows per call, {} rows max",
        config.analytics.default_period, config.analytics.row_limit, config.analytics.max_rows
    );

    let state = Arc::new(AppState {
        connector,
        auth: auth_service,
        analytics: config.analytics.clone(),
    });
    let api_router = api::create_api_router(state);

    let api_addr = format!("{}:{}", config.server.host, config.server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("🚀 API server listening on http://{}", api_addr);
    info!("   - Sign in at http://{}/api/auth/google", api_addr);

    axum::serve(api_listener, api_router).await?;

    Ok(())
}
