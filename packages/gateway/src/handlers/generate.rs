use std::convert::Infallible;

use axum::Json;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthSession;
use crate::extractors::json::AppJson;
use crate::generation::{ChannelSink, EventSink, Orchestrator};
use crate::models::generate::{
    ErrorEvent, GenerateImageRequest, GenerateImageResponse, StreamEvent,
};
use crate::state::AppState;

/// Events buffered between the worker and a slow client.
const STREAM_BUFFER: usize = 8;

/// Body limit for routes accepting inline base64 images (32MB).
pub fn generation_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(32 * 1024 * 1024)
}

fn accepts_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/event-stream"))
}

/// Generate or edit images.
#[utoipa::path(
    post,
    path = "/image",
    tag = "Generation",
    operation_id = "generateImage",
    summary = "Generate or edit images",
    description = "Runs up to five generation attempts. Without streaming, the response lists every \
        stored image and `ok` is false when none was produced; a provider failure aborts the request. \
        With `stream: true` or `Accept: text/event-stream` the response is a server-sent event stream: \
        `start`, one `item` or `skip` per attempt, then `done` (or `error` if every attempt failed).",
    request_body = GenerateImageRequest,
    responses(
        (status = 200, description = "Generation finished or stream opened", content(
            (GenerateImageResponse = "application/json"),
            (String = "text/event-stream"),
        )),
        (status = 400, description = "Invalid request (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "No live session (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Referenced history item not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Provider failure (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip_all, fields(user_key = %auth.user_key, action = payload.action.as_str()))]
pub async fn generate_image(
    State(state): State<AppState>,
    auth: AuthSession,
    headers: HeaderMap,
    AppJson(payload): AppJson<GenerateImageRequest>,
) -> Result<Response, AppError> {
    let streaming = payload.stream || accepts_event_stream(&headers);
    let orchestrator = Orchestrator::from_state(&state);
    let job = orchestrator.prepare(&auth.user_key, payload).await?;

    if !streaming {
        let outcome = orchestrator.run_batch(&job).await?;
        let body = GenerateImageResponse {
            ok: !outcome.items.is_empty(),
            items: outcome.items,
            text_note: outcome.last_text_note,
        };
        return Ok(Json(body).into_response());
    }

    let (tx, mut rx) = mpsc::channel::<Event>(STREAM_BUFFER);
    let worker_tx = tx.clone();
    let worker = tokio::spawn(async move {
        let mut sink = ChannelSink::new(worker_tx);
        orchestrator.run_stream(&job, &mut sink).await;
    });

    // Holds the last sender so the stream closes only once the worker is done.
    tokio::spawn(async move {
        if let Err(e) = worker.await {
            tracing::error!("Generation worker aborted: {}", e);
            let event = StreamEvent::Error(ErrorEvent {
                message: "Generation failed".into(),
            });
            let _ = ChannelSink::new(tx)
                .emit(event.name(), event.payload())
                .await;
        }
    });

    let stream = futures::stream::poll_fn(move |cx| {
        rx.poll_recv(cx).map(|event| event.map(Ok::<_, Infallible>))
    });
    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response())
}
