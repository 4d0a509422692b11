use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::storage::MediaKey;
use sea_orm::ConnectionTrait;
use tracing::instrument;

use crate::entity::history_record;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthSession;
use crate::extractors::query::AppQuery;
use crate::history::{Cursor, HistoryLedger, clamp_limit};
use crate::models::history::{HistoryItem, HistoryPageResponse, HistoryQuery};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;

/// Load a record owned by `user_key`; foreign records look missing.
pub(crate) async fn find_owned<C: ConnectionTrait>(
    db: &C,
    user_key: &str,
    id: &str,
) -> Result<history_record::Model, AppError> {
    HistoryLedger::new(db)
        .get_by_id(id)
        .await?
        .filter(|r| r.user_key == user_key)
        .ok_or_else(|| AppError::NotFound("History item not found".into()))
}

/// List the caller's history, newest first.
#[utoipa::path(
    get,
    path = "/",
    tag = "History",
    operation_id = "listHistory",
    summary = "List history",
    description = "Returns the caller's artifacts ordered newest first. Pass `nextCursor` back as \
        `cursor` to fetch the following page; it is `null` on the last page.",
    params(HistoryQuery),
    responses(
        (status = 200, description = "One page of history", body = HistoryPageResponse),
        (status = 400, description = "Malformed cursor (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "No live session (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip_all, fields(user_key = %auth.user_key))]
pub async fn list_history(
    State(state): State<AppState>,
    auth: AuthSession,
    AppQuery(query): AppQuery<HistoryQuery>,
) -> Result<Json<HistoryPageResponse>, AppError> {
    let cursor = query
        .cursor
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(Cursor::decode)
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let limit = clamp_limit(query.limit.unwrap_or(DEFAULT_PAGE_SIZE));

    let page = HistoryLedger::new(&state.db)
        .list_page(&auth.user_key, limit, cursor.as_ref())
        .await?;

    Ok(Json(HistoryPageResponse {
        items: page.items.into_iter().map(HistoryItem::from).collect(),
        next_cursor: page.next_cursor,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "History",
    operation_id = "getHistoryItem",
    summary = "Get a history item",
    params(("id" = String, Path, description = "Artifact ID")),
    responses(
        (status = 200, description = "The item", body = HistoryItem),
        (status = 401, description = "No live session (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, auth), fields(user_key = %auth.user_key))]
pub async fn get_history_item(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<String>,
) -> Result<Json<HistoryItem>, AppError> {
    let record = find_owned(&state.db, &auth.user_key, &id).await?;
    Ok(Json(record.into()))
}

/// Delete an artifact and its bytes.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "History",
    operation_id = "deleteHistoryItem",
    summary = "Delete a history item",
    description = "Removes the history row, then the stored media. If the media removal fails the \
        item is still gone from history.",
    params(("id" = String, Path, description = "Artifact ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "No live session (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, auth), fields(user_key = %auth.user_key))]
pub async fn delete_history_item(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    find_owned(&state.db, &auth.user_key, &id).await?;

    let record = HistoryLedger::new(&state.db)
        .delete_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("History item not found".into()))?;

    match MediaKey::parse(&record.blob_key) {
        Ok(key) => match state.media.delete(&key).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(blob_key = %record.blob_key, "Blob already missing"),
            Err(e) => tracing::warn!(blob_key = %record.blob_key, "Failed to delete blob: {}", e),
        },
        Err(e) => tracing::warn!("Unparseable blob key on deleted record: {}", e),
    }

    tracing::info!("History item deleted");
    Ok(StatusCode::NO_CONTENT)
}
