use std::sync::Arc;

use tracing::{error, info};

use ledgerbox::store::Drive;
use ledgerbox::web::WebServer;
use ledgerbox::{Config, Database};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = ledgerbox::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        ledgerbox::logging::init_console_only(&config.logging.level);
    }

    info!("Ledgerbox starting");

    if let Err(e) = run(config).await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> ledgerbox::Result<()> {
    config.validate()?;

    let db = Database::open(&config.database.path).await?;
    info!("Database schema version {}", db.schema_version().await?);

    let drive = Drive::new(Arc::new(db)).with_page_size(config.store.page_size)?;

    let server = WebServer::new(&config.server, drive)?;
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    server.run().await
}
