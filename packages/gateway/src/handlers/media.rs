use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::storage::MediaKey;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use super::history::find_owned;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthSession;
use crate::state::AppState;

/// Artifacts never change once written.
const CACHE_CONTROL: &str = "private, max-age=31536000, immutable";

fn etag_for(id: &str) -> String {
    format!("\"{id}\"")
}

fn is_not_modified(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|t| t.trim() == etag || t.trim() == "*"))
}

/// Stream an artifact's bytes.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Media",
    operation_id = "getMedia",
    summary = "Download an artifact",
    description = "Streams the stored media. The ETag is the quoted artifact id; a matching \
        If-None-Match yields an empty 304.",
    params(("id" = String, Path, description = "Artifact ID")),
    responses(
        (status = 200, description = "Media bytes", content_type = "application/octet-stream"),
        (status = 304, description = "Not modified"),
        (status = 401, description = "No live session (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, auth, headers), fields(user_key = %auth.user_key))]
pub async fn get_media(
    State(state): State<AppState>,
    auth: AuthSession,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = find_owned(&state.db, &auth.user_key, &id).await?;

    let etag = etag_for(&record.id);
    if is_not_modified(&headers, &etag) {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let key = MediaKey::parse(&record.blob_key)?;
    let reader = state.media.get_stream(&key).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &record.mime_type)
        .header(header::ETAG, &etag)
        .header(header::CACHE_CONTROL, CACHE_CONTROL)
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
