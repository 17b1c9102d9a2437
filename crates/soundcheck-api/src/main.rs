use soundcheck_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (telemetry, database, storage, routes)
    let (_state, router) = soundcheck_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    soundcheck_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
