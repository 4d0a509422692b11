use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use thiserror::Error;

use crate::entity::history_record;

/// Resume point for history listing: the `(created_at, id)` of the last row seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: i64,
    pub id: String,
}

#[derive(Debug, PartialEq, Eq, Error)]
#[error("malformed cursor")]
pub struct CursorError;

impl Cursor {
    pub fn after(record: &history_record::Model) -> Self {
        Self {
            created_at: record.created_at,
            id: record.id.clone(),
        }
    }

    /// Opaque string form handed to clients.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(format!("{}:{}", self.created_at, self.id))
    }

    pub fn decode(s: &str) -> Result<Self, CursorError> {
        let raw = URL_SAFE_NO_PAD.decode(s).map_err(|_| CursorError)?;
        let text = String::from_utf8(raw).map_err(|_| CursorError)?;
        let (ts, id) = text.split_once(':').ok_or(CursorError)?;
        let created_at = ts.parse::<i64>().map_err(|_| CursorError)?;
        if id.is_empty() {
            return Err(CursorError);
        }
        Ok(Self {
            created_at,
            id: id.to_string(),
        })
    }
}
