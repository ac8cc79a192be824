//! Executable routes

use axum::{routing::get, Router};

use crate::{handlers::executables::download_executable_handler, AppState};

/// Create executable routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/executables/:hash", get(download_executable_handler))
}
