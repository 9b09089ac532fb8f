pub mod api;
pub mod config;
pub mod services;
pub mod utils;

use crate::config::UploadConfig;
use crate::services::upload_service::UploadService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Video Upload Backend",
        description = "Accepts a single file upload up to 500 MB and saves it under the upload directory.",
        version = "1.0.0"
    ),
    paths(
        api::handlers::health::health_check,
        api::handlers::upload::upload_video,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::upload::UploadSuccessResponse,
            api::handlers::upload::UploadForm,
            api::error::ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Service health and readiness checks"),
        (name = "Upload", description = "Endpoints for uploading video files")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: UploadConfig,
    pub upload_service: Arc<UploadService>,
}

impl AppState {
    pub fn new(config: UploadConfig) -> Self {
        let upload_service = Arc::new(UploadService::new(&config));
        Self {
            config,
            upload_service,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::health::health_check))
        .route(
            "/upload",
            post(api::handlers::upload::upload_video)
                .layer(DefaultBodyLimit::max(state.config.body_limit())),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
