use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::storage::{MediaKey, MediaStore};
use sea_orm::ConnectionTrait;

use crate::entity::history_record::KIND_IMAGE;
use crate::error::AppError;
use crate::history::HistoryLedger;
use crate::models::generate::ImageInput;
use crate::upstream::ImagePart;

/// Decode an inline image payload, tolerating a `data:<mime>;base64,` prefix.
pub fn decode_inline(mime_type: &str, data: &str) -> Result<ImagePart, AppError> {
    if !mime_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "Unsupported image type: {mime_type}"
        )));
    }

    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| AppError::Validation("Image data is not valid base64".into()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Image data must not be empty".into()));
    }

    Ok(ImagePart {
        bytes,
        mime_type: mime_type.to_string(),
    })
}

/// Turn a request image into bytes the provider can consume.
///
/// History references must point at an image owned by `user_key`; anything
/// else is reported as not found.
pub async fn resolve_image<C: ConnectionTrait>(
    db: &C,
    media: &dyn MediaStore,
    user_key: &str,
    input: &ImageInput,
) -> Result<ImagePart, AppError> {
    match input {
        ImageInput::Inline { mime_type, data } => decode_inline(mime_type, data),
        ImageInput::Reference { history_id } => {
            let record = HistoryLedger::new(db)
                .get_by_id(history_id)
                .await?
                .filter(|r| r.user_key == user_key && r.kind == KIND_IMAGE)
                .ok_or_else(|| AppError::NotFound("History item not found".into()))?;

            let key = MediaKey::parse(&record.blob_key)?;
            let bytes = media.get(&key).await?;
            Ok(ImagePart {
                bytes,
                mime_type: record.mime_type,
            })
        }
    }
}
