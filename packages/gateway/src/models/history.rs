use serde::{Deserialize, Serialize};

use crate::entity::history_record;

/// Query parameters for listing history.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Page size, clamped to 1-50. Default: 20.
    pub limit: Option<i64>,
    /// Opaque cursor from a previous page's `nextCursor`.
    pub cursor: Option<String>,
}

/// Public path under which an artifact's bytes are served.
pub fn media_url(id: &str) -> String {
    format!("/api/media/{id}")
}

/// One generated artifact.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    /// "image" or "video".
    #[schema(example = "image")]
    pub kind: String,
    #[schema(example = "a lighthouse at dusk, watercolor")]
    pub prompt: String,
    /// Creation time, Unix epoch milliseconds.
    #[schema(example = 1735689600000_i64)]
    pub created_at: i64,
    #[schema(example = "image/png")]
    pub mime_type: String,
    #[schema(example = "/api/media/01936f0e-1234-7abc-8000-000000000001")]
    pub media_url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub extra: Option<serde_json::Value>,
}

impl From<history_record::Model> for HistoryItem {
    fn from(model: history_record::Model) -> Self {
        Self {
            media_url: media_url(&model.id),
            id: model.id,
            kind: model.kind,
            prompt: model.prompt,
            created_at: model.created_at,
            mime_type: model.mime_type,
            width: model.width,
            height: model.height,
            extra: model.extra,
        }
    }
}

/// A page of history, newest first.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPageResponse {
    pub items: Vec<HistoryItem>,
    /// Cursor for the next page, `null` on the last page.
    pub next_cursor: Option<String>,
}
