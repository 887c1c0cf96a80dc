use std::env;
use tracing::info;
use vacation_sync::config;
use vacation_sync::startup;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Load configuration
    let config = match startup::load_config() {
        Ok(config) => config,
        Err(e) => {
            // Logging is not up yet; show the report before the pause
            if config::pause_on_exit_hint(|key| env::var(key).ok()) {
                eprintln!("{:?}", e);
                startup::wait_for_enter().await;
                std::process::exit(1);
            }
            return Err(e);
        }
    };

    // Initialize logging
    startup::init_logging(config.verbose)?;

    info!(
        "Starting vacation sync for {} ({} sign-in)",
        config.group_name, config.auth_flow
    );

    let result = startup::run(&config).await;

    if config.pause_on_exit {
        startup::wait_for_enter().await;
    }

    result.map(|_| ())
}
