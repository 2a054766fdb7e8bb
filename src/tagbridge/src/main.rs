//! TagBridge — cross-platform analytics bridging pipeline host.
//!
//! Entry point that loads configuration, runs the analytics bootstrap
//! sequence, and hands the resulting pipeline handles to the application.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use tagbridge_bootstrap::{AnalyticsLoader, HttpScriptFetcher, NoopHost, ScriptHost};
use tagbridge_core::config::AppConfig;
use tagbridge_core::context::FixedPage;

#[derive(Parser, Debug)]
#[command(name = "tagbridge")]
#[command(about = "Cross-platform analytics bridging pipeline")]
#[command(version)]
struct Cli {
    /// Analytics property id (overrides config)
    #[arg(long, env = "TAGBRIDGE__ANALYTICS__ANALYTICS_ID")]
    analytics_id: Option<String>,

    /// Tag-manager container id (overrides config)
    #[arg(long, env = "TAGBRIDGE__ANALYTICS__GTM_ID")]
    gtm_id: Option<String>,

    /// Tag emitted events as internal traffic
    #[arg(long, default_value_t = false)]
    debug_traffic: bool,

    /// Asset origin the script paths resolve against
    #[arg(long, default_value = "https://localhost")]
    asset_origin: String,

    /// Page URL reported to the pipeline
    #[arg(long, default_value = "https://localhost/")]
    page_url: String,

    /// Page title reported to the pipeline
    #[arg(long, default_value = "TagBridge")]
    page_title: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagbridge=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("TagBridge starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(id) = cli.analytics_id {
        config.analytics.analytics_id = id;
    }
    if let Some(id) = cli.gtm_id {
        config.analytics.gtm_id = id;
    }
    if cli.debug_traffic {
        config.analytics.debug = true;
    }

    info!(
        analytics_id = %config.analytics.analytics_id,
        gtm_id = %config.analytics.gtm_id,
        debug = config.analytics.debug,
        fail_open = config.analytics.fail_open,
        "Configuration loaded"
    );

    let page = Arc::new(FixedPage::new(cli.page_url, cli.page_title));
    let fetcher = HttpScriptFetcher::new(cli.asset_origin);

    // Run the bootstrap sequence; application startup gates on its result.
    let loader = AnalyticsLoader::new(config.analytics.clone(), fetcher, page)
        .with_host(Arc::new(NoopHost) as Arc<dyn ScriptHost>);

    let handle = match loader.load(Vec::new()).await {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, "Analytics bootstrap failed");
            return Err(e.into());
        }
    };

    let drained = handle.scheduler.run_until_idle();
    info!(
        loaded = handle.loaded,
        records = handle.data_layer.len(),
        deferred = drained,
        platform = %handle.platform.platform_id,
        "TagBridge is ready, application bootstrap may proceed"
    );

    // The application main loop starts here; the data layer, command handle,
    // and scheduler in `handle` live for the rest of the process.

    Ok(())
}
