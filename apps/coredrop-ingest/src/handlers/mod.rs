//! Request handlers

pub mod cores;
pub mod executables;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use coredrop_domain::IngestionError;
use std::{io, path::Path};
use tokio_util::io::ReaderStream;
use tracing::error;

use crate::dto::cores::ErrorResponse;

/// HTTP status reported for a pipeline error
pub(crate) fn status_for(err: &IngestionError) -> StatusCode {
    match err {
        IngestionError::Framing(_) => StatusCode::BAD_REQUEST,
        IngestionError::HeaderDecode(_) => StatusCode::BAD_REQUEST,
        IngestionError::InvalidId(_) => StatusCode::BAD_REQUEST,
        IngestionError::StorageWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
        IngestionError::Index(_) => StatusCode::INTERNAL_SERVER_ERROR,
        IngestionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(status: StatusCode, uid: Option<String>, error: String) -> Response {
    (status, Json(ErrorResponse { uid, error })).into_response()
}

/// Stream a stored artifact back to the client
pub(crate) async fn stream_file(path: &Path, filename: &str) -> Response {
    match tokio::fs::File::open(path).await {
        Ok(file) => {
            let headers = [
                (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ];
            (headers, Body::from_stream(ReaderStream::new(file))).into_response()
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => error_response(
            StatusCode::NOT_FOUND,
            None,
            format!("{} not found", filename),
        ),
        Err(err) => {
            error!(path = %path.display(), error = ?err, "Failed to open artifact");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                None,
                format!("cannot read {}", filename),
            )
        }
    }
}
