//! API routes

pub mod cores;
pub mod executables;

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    dto::cores::{CoredumpResponse, ErrorResponse, UploadResponse},
    handlers, AppState,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::cores::upload_handler,
        handlers::cores::download_core_handler,
        handlers::cores::core_record_handler,
        handlers::executables::download_executable_handler,
        health_handler
    ),
    components(
        schemas(UploadResponse, ErrorResponse, CoredumpResponse)
    ),
    tags(
        (name = "cores", description = "Coredump upload and retrieval"),
        (name = "executables", description = "Stored executables"),
        (name = "health", description = "Health check endpoints")
    ),
    info(
        title = "Coredrop Ingest API",
        version = "0.1.0",
        description = "Ingestion endpoint of the coredrop crash-dump collector",
        contact(
            name = "Coredrop Team"
        )
    )
)]
pub struct ApiDoc;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(cores::routes())
        .merge(executables::routes())
        .route("/health", axum::routing::get(health_handler))
        .with_state(state)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    ),
    tag = "health"
)]
async fn health_handler() -> &'static str {
    "OK"
}
