use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::api::context::{AppContext, AppState};
use crate::api::{handlers, upload_handlers};
use crate::logic::UploadConfig;
use crate::store::traits::Store;

pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn create_router<S: Store + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // API Documentation
        .route("/docs", get(handlers::get_api_docs))
        .route("/docs/openapi.json", get(handlers::get_openapi_spec))
        .nest("/api/v1", api_routes::<S>())
}

fn api_routes<S: Store + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Users
        .route(
            "/users",
            get(handlers::list_users::<S>).post(handlers::create_user::<S>),
        )
        .route(
            "/users/:id",
            get(handlers::get_user::<S>).delete(handlers::delete_user::<S>),
        )
        .route("/users/:id/sessions", get(handlers::list_user_sessions::<S>))
        // Sessions
        .route("/sessions", post(handlers::create_session::<S>))
        .route(
            "/sessions/:id",
            get(handlers::get_session::<S>).delete(handlers::delete_session::<S>),
        )
        // Photos
        .route(
            "/photos",
            get(handlers::list_photos::<S>).post(handlers::create_photo::<S>),
        )
        .route(
            "/photos/:id",
            get(handlers::get_photo::<S>).delete(handlers::delete_photo::<S>),
        )
        // Uploads
        .route("/upload/base64", post(upload_handlers::upload_base64::<S>))
        .route("/upload/file", post(upload_handlers::upload_file::<S>))
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
            header::ACCEPT,
            header::ORIGIN,
        ])
        .expose_headers([header::CONTENT_DISPOSITION])
        .max_age(Duration::from_secs(3600))
}

/// Full application: API routes, uploaded files served from the upload
/// directory, CORS and the raised body limit.
pub fn create_app<S: Store + 'static>(store: Arc<S>, uploads: UploadConfig) -> Router {
    let mount = format!("/{}", uploads.public_prefix.trim_matches('/'));
    let files = ServeDir::new(&uploads.dir);
    let state: AppState<S> = Arc::new(AppContext::new(store, uploads));

    let router = if mount == "/" {
        create_router::<S>().fallback_service(files)
    } else {
        create_router::<S>().nest_service(&mount, files)
    };

    router
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors_layer())
        .with_state(state)
}
