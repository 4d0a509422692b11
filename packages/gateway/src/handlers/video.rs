use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthSession;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::generation::Orchestrator;
use crate::models::video::{
    StartVideoRequest, StartVideoResponse, VideoStatusQuery, VideoStatusResponse,
};
use crate::state::AppState;

/// Start a video generation job.
#[utoipa::path(
    post,
    path = "/start",
    tag = "Video",
    operation_id = "startVideo",
    summary = "Start a video job",
    description = "Submits the job to the provider and returns its operation name immediately. \
        Poll `/api/video/status` until `done` is true.",
    request_body = StartVideoRequest,
    responses(
        (status = 200, description = "Job accepted", body = StartVideoResponse),
        (status = 400, description = "Invalid request (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "No live session (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Referenced history item not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Provider failure (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip_all, fields(user_key = %auth.user_key))]
pub async fn start_video(
    State(state): State<AppState>,
    auth: AuthSession,
    AppJson(payload): AppJson<StartVideoRequest>,
) -> Result<Json<StartVideoResponse>, AppError> {
    let operation_name = Orchestrator::from_state(&state)
        .start_video(&auth.user_key, payload)
        .await?;
    Ok(Json(StartVideoResponse { operation_name }))
}

/// Check a video job once.
#[utoipa::path(
    get,
    path = "/status",
    tag = "Video",
    operation_id = "videoStatus",
    summary = "Poll a video job",
    description = "Performs one status check. On success the video is stored in history and the \
        operation name stops resolving. Clients should wait several seconds between polls.",
    params(VideoStatusQuery),
    responses(
        (status = 200, description = "Current job state", body = VideoStatusResponse),
        (status = 401, description = "No live session (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Unknown, expired or foreign operation (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Provider failure (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip_all, fields(user_key = %auth.user_key, operation = %query.name))]
pub async fn video_status(
    State(state): State<AppState>,
    auth: AuthSession,
    AppQuery(query): AppQuery<VideoStatusQuery>,
) -> Result<Json<VideoStatusResponse>, AppError> {
    let status = Orchestrator::from_state(&state)
        .video_status(&auth.user_key, &query.name)
        .await?;
    Ok(Json(status))
}
