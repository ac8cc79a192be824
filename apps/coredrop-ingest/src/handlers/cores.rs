//! Coredump handlers

use axum::{
    body::Body,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coredrop_domain::{ports::ArtifactStore, CoredumpId};
use futures::TryStreamExt;
use std::io;
use tokio_util::io::{StreamReader, SyncIoBridge};
use tracing::{error, info};

use super::{error_response, status_for, stream_file};
use crate::{
    dto::cores::{CoredumpResponse, ErrorResponse, UploadResponse},
    AppState,
};

/// Handle a coredump upload
///
/// The body is streamed through the pipeline as it arrives: gzip(header JSON)
/// followed by gzip(core) and gzip(executable).
#[utoipa::path(
    post,
    path = "/cores",
    request_body(
        content = String,
        description = "Three concatenated gzip members: header JSON, core image, executable image",
        content_type = "application/octet-stream"
    ),
    responses(
        (status = 201, description = "Coredump ingested successfully", body = UploadResponse),
        (status = 400, description = "Malformed upload or header", body = ErrorResponse),
        (status = 500, description = "Storage or index failure", body = ErrorResponse)
    ),
    tag = "cores"
)]
pub async fn upload_handler(State(state): State<AppState>, body: Body) -> Response {
    let stream = body.into_data_stream().map_err(io::Error::other);
    let reader = SyncIoBridge::new(StreamReader::new(stream));

    match state.ingestion_service.ingest(reader).await {
        Ok(coredump) => {
            info!(uid = %coredump.uid, hostname = %coredump.hostname, "Successfully ingested coredump");
            (
                StatusCode::CREATED,
                Json(UploadResponse {
                    uid: coredump.uid.to_string(),
                    message: "Coredump ingested successfully".to_string(),
                }),
            )
                .into_response()
        }
        Err(failure) => error_response(
            status_for(&failure.error),
            Some(failure.uid.to_string()),
            failure.error.to_string(),
        ),
    }
}

/// Download a stored core image
#[utoipa::path(
    get,
    path = "/cores/{uid}",
    params(("uid" = String, Path, description = "Upload identity returned by POST /cores")),
    responses(
        (status = 200, description = "Raw core image", body = String, content_type = "application/octet-stream"),
        (status = 400, description = "Malformed uid", body = ErrorResponse),
        (status = 404, description = "No such core", body = ErrorResponse)
    ),
    tag = "cores"
)]
pub async fn download_core_handler(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Response {
    let uid: CoredumpId = match uid.parse() {
        Ok(uid) => uid,
        Err(err) => return error_response(status_for(&err), None, err.to_string()),
    };

    let path = state.ingestion_service.store().core_path(&uid);
    stream_file(&path, &format!("{}.core", uid)).await
}

/// Fetch the indexed record of an upload
#[utoipa::path(
    get,
    path = "/cores/{uid}/record",
    params(("uid" = String, Path, description = "Upload identity returned by POST /cores")),
    responses(
        (status = 200, description = "Indexed record", body = CoredumpResponse),
        (status = 400, description = "Malformed uid", body = ErrorResponse),
        (status = 404, description = "Upload not indexed", body = ErrorResponse)
    ),
    tag = "cores"
)]
pub async fn core_record_handler(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Response {
    let uid: CoredumpId = match uid.parse() {
        Ok(uid) => uid,
        Err(err) => return error_response(status_for(&err), None, err.to_string()),
    };

    match state.ingestion_service.index().get(&uid).await {
        Ok(Some(coredump)) => Json(CoredumpResponse::from(coredump)).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            Some(uid.to_string()),
            format!("coredump {} is not indexed", uid),
        ),
        Err(err) => {
            error!(uid = %uid, error = ?err, "Failed to read index record");
            error_response(status_for(&err), Some(uid.to_string()), err.to_string())
        }
    }
}
