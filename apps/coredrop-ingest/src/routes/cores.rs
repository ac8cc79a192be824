//! Coredump routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::cores::{core_record_handler, download_core_handler, upload_handler},
    AppState,
};

/// Create coredump routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cores", post(upload_handler))
        .route("/cores/:uid", get(download_core_handler))
        .route("/cores/:uid/record", get(core_record_handler))
}
