pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;
pub use api::{create_app, create_router, AppContext, AppState};

// Export logic types
pub use logic::{
    PhotoService, ServiceError, ServiceResult, SessionService, StoredUpload, UploadConfig,
    UploadError, UploadPipeline, UserService,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{MemoryStore, PostgresStore, Store};

use crate::config::{AppConfig, StorageBackend};

/// Open the configured backend, running migrations for PostgreSQL
pub async fn build_app(config: &AppConfig) -> anyhow::Result<axum::Router> {
    let uploads = config.upload_config();
    let app = match config.storage.backend {
        StorageBackend::Postgres => {
            let database_url = config.database_url()?;
            let store = PostgresStore::new(&database_url, config.max_connections()).await?;
            store.migrate().await?;
            create_app(std::sync::Arc::new(store), uploads)
        }
        StorageBackend::Memory => {
            log::warn!("Using in-memory storage; data is lost on shutdown");
            create_app(std::sync::Arc::new(MemoryStore::new()), uploads)
        }
    };
    Ok(app)
}
