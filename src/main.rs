#![cfg(not(tarpaulin_include))]

use bitacora::app;
use bitacora::config::AppConfig;

/// Main entry point for the web dashboard
///
/// Reads the configuration from the environment (and `.env`), then serves
/// the dashboard until interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    app::run(config).await
}
