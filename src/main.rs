use anyhow::Result;
use tokio::signal;
use tracing::{error, info};

use chan_nope::config::Config;
use chan_nope::init::{init_store, setup_logging};
use chan_nope::service::BlockerService;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load Config
    let config_path = std::env::args().nth(1).unwrap_or("config.toml".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).await?
    } else {
        Config::default()
    };

    // 2. Setup Logging
    setup_logging(&config);
    info!("Starting chan-nope...");

    if !std::path::Path::new(&config_path).exists() {
        info!("Config file not found, using defaults.");
    }

    // 3. Init Store & Service
    let store = init_store(&config)?;
    let service = BlockerService::init(store).await?;

    // 4. Start Management API
    let api_service = service.clone();
    let api_host = config.host.clone();
    let api_port = config.port;
    let api = tokio::spawn(async move {
        if let Err(e) = chan_nope::api::start_api_server(api_service, &api_host, api_port).await {
            error!("API server failed: {:#}", e);
        }
    });

    // 5. Graceful Shutdown
    tokio::select! {
        _ = api => {},
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received.");
        }
    }

    Ok(())
}
