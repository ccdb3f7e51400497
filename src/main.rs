use tracing_subscriber::EnvFilter;

use feature_flag_manager::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up AWS_* and FLAGS_* settings
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!(
        "Starting feature flag manager in {:?} mode with {:?} store",
        config.environment,
        config.store.backend
    );
    if feature_flag_manager::is_development!() {
        tracing::info!("Development mode: bootstrap admin is {:?}", config.security.bootstrap_admin);
    }

    feature_flag_manager::server::serve(config).await
}
