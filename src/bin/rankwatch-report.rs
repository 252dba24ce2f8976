use anyhow::{Context, Result};
use clap::Parser;
use rankwatch::analytics::{estimate_indexing_status, get_site_analytics, AnalyticsPeriod, QueryLimits};
use rankwatch::auth::GoogleCredentials;
use rankwatch::config::{AnalyticsConfig, SearchConsoleConfig};
use rankwatch::search_console::{GoogleConnector, SearchConsoleConnector};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rankwatch-report")]
#[command(about = "Print Search Console analytics for one property as JSON", long_about = None)]
struct Cli {
    /// Property identifier, e.g. https://example.com/ or sc-domain:example.com
    #[arg(long)]
    site_url: String,

    /// Comparison window (7d, 28d, 3mo, 6mo, 12mo, 16mo)
    #[arg(long)]
    period: Option<AnalyticsPeriod>,

    /// OAuth access token with the webmasters.readonly scope
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Print the indexing estimate instead of the analytics snapshot
    #[arg(long)]
    indexing: bool,

    /// Compact JSON output
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let analytics = AnalyticsConfig::from_env()?;
    let connector = GoogleConnector::from_config(&SearchConsoleConfig::from_env()?)?;

    let credentials = GoogleCredentials {
        access_token: cli.access_token,
        refresh_token: None,
        id_token: None,
        scope: None,
        token_type: Some("Bearer".to_string()),
        expiry_date: None,
    };
    let client = connector.connect(&credentials);
    let today = chrono::Utc::now().date_naive();

    let output = if cli.indexing {
        let status = estimate_indexing_status(
            client.as_ref(),
            &cli.site_url,
            today,
            analytics.indexing_lookback_days,
            analytics.row_limit,
        )
        .await
        .with_context(|| format!("failed to estimate indexing for {}", cli.site_url))?;
        serde_json::to_value(status)?
    } else {
        let period = cli.period.unwrap_or(analytics.default_period);
        let snapshot = get_site_analytics(
            client.as_ref(),
            &cli.site_url,
            period.days(),
            today,
            QueryLimits::from(&analytics),
        )
        .await
        .with_context(|| format!("failed to fetch analytics for {}", cli.site_url))?;
        serde_json::to_value(snapshot)?
    };

    let rendered = if cli.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{}", rendered);

    Ok(())
}
