use crate::components::auth::{AuthSettings, TokenManager};
use crate::components::GraphClient;
use crate::config::Config;
use crate::error::{Error, SyncResult};
use crate::sync::{self, SyncPlan, SyncReport};
use reqwest::Client;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging(verbose: bool) -> miette::Result<()> {
    let default_filter = if verbose {
        "info,vacation_sync=debug,reqwest=warn,hyper=warn"
    } else {
        "info,reqwest=warn,hyper=warn"
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the configuration
pub fn load_config() -> miette::Result<Config> {
    Config::load().map_err(Into::into)
}

/// Sign in and build the Graph client
pub async fn connect(config: &Config) -> SyncResult<GraphClient> {
    let http = Client::new();

    let mut settings = AuthSettings::new(
        &config.client_id,
        &config.tenant_id,
        &config.authority_host,
    );
    settings.redirect_port = config.redirect_port;

    let tokens = TokenManager::new(settings, config.auth_flow.credential_flow(), http.clone());
    tokens.sign_in().await?;

    Ok(GraphClient::new(http, &config.graph_base_url, tokens))
}

/// Authenticate, then run the pipeline once
pub async fn run(config: &Config) -> miette::Result<SyncReport> {
    let plan = SyncPlan::from_config(config)?;

    let client = connect(config).await.inspect_err(|e| {
        error!("Sign-in failed: {}", e);
    })?;

    let report = sync::run(&client, &plan).await?;
    info!(
        "Sync complete: {} removed, {} created",
        report.clean.as_ref().map_or(0, |c| c.deleted),
        report.publish.created
    );
    Ok(report)
}

/// Keep the console open until the user presses Enter
pub async fn wait_for_enter() {
    println!("Press Enter to exit...");
    let mut line = String::new();
    let mut stdin = BufReader::new(tokio::io::stdin());
    let _ = stdin.read_line(&mut line).await;
}
