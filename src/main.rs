use axum::serve;
use photobooth::config::{AppConfig, StorageBackend};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress sqlx debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_default_env()
        .init();

    println!("Photobooth API Server");

    let config = AppConfig::load()?;
    println!(
        "Configuration loaded: server={}:{}, storage={:?}",
        config.server.host, config.server.port, config.storage.backend
    );

    if config.storage.backend == StorageBackend::Postgres {
        println!("Connecting to PostgreSQL and running migrations...");
    }
    let app = photobooth::build_app(&config).await?;
    println!(
        "Uploads stored in {} and served at {}",
        config.storage.upload_dir, config.storage.public_prefix
    );

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    println!("Photobooth server running on http://{}", bind_address);
    println!("API documentation available at http://{}/docs", bind_address);

    serve(listener, app).await?;

    Ok(())
}
