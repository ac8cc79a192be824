//! Executable handlers

use axum::{
    extract::{Path, State},
    response::Response,
};
use coredrop_domain::{ports::ArtifactStore, ExecutableHash};

use super::{error_response, status_for, stream_file};
use crate::{dto::cores::ErrorResponse, AppState};

/// Download a stored executable by content hash
#[utoipa::path(
    get,
    path = "/executables/{hash}",
    params(("hash" = String, Path, description = "Executable hash sent in the upload header")),
    responses(
        (status = 200, description = "Raw executable image", body = String, content_type = "application/octet-stream"),
        (status = 400, description = "Invalid hash", body = ErrorResponse),
        (status = 404, description = "No such executable", body = ErrorResponse)
    ),
    tag = "executables"
)]
pub async fn download_executable_handler(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Response {
    let hash = match ExecutableHash::parse(hash) {
        Ok(hash) => hash,
        Err(err) => return error_response(status_for(&err), None, err.to_string()),
    };

    let path = state.ingestion_service.store().executable_path(&hash);
    stream_file(&path, &format!("{}.exe", hash)).await
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{app, body_bytes, send, upload_body};
    use axum::http::{header, StatusCode};

    #[tokio::test(flavor = "multi_thread")]
    async fn test_executable_shared_between_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;

        for core in [&b"CORE-1"[..], &b"CORE-2"[..]] {
            let response = send(&app, "POST", "/cores", upload_body(core, b"EXE")).await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let executables = std::fs::read_dir(dir.path().join("artifacts/executables")).unwrap();
        assert_eq!(executables.count(), 1);
        let cores = std::fs::read_dir(dir.path().join("artifacts/cores")).unwrap();
        assert_eq!(cores.count(), 2);

        let response = send(&app, "GET", "/executables/abc123", Vec::new()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        assert_eq!(body_bytes(response).await, b"EXE");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_hash_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;

        let response = send(&app, "GET", "/executables/a.b", Vec::new()).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_executable_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;

        let response = send(&app, "GET", "/executables/ffff", Vec::new()).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
