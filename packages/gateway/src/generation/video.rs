use tracing::instrument;
use uuid::Uuid;

use super::inputs::resolve_image;
use super::orchestrator::{Orchestrator, item_for};
use crate::entity::history_record::KIND_VIDEO;
use crate::error::AppError;
use crate::history::HistoryLedger;
use crate::models::video::{
    DEFAULT_ASPECT_RATIO, StartVideoRequest, VideoStatusResponse, validate_aspect_ratio,
};
use crate::upstream::VideoStatus;
use crate::video::VideoOperationStore;

/// History id for the artifact of a video operation.
///
/// Derived from the operation name so repeated finalization lands on one row.
pub fn video_record_id(operation_name: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, operation_name.as_bytes()).to_string()
}

impl Orchestrator {
    /// Submit a video job and remember who owns it.
    #[instrument(skip_all, fields(user_key = %user_key))]
    pub async fn start_video(
        &self,
        user_key: &str,
        request: StartVideoRequest,
    ) -> Result<String, AppError> {
        if request.prompt.trim().is_empty() {
            return Err(AppError::Validation("Prompt must not be empty".into()));
        }
        let aspect_ratio = request
            .aspect_ratio
            .unwrap_or_else(|| DEFAULT_ASPECT_RATIO.to_string());
        if !validate_aspect_ratio(&aspect_ratio) {
            return Err(AppError::Validation(format!(
                "Unsupported aspect ratio: {aspect_ratio}"
            )));
        }

        let image = match &request.image {
            Some(input) => Some(resolve_image(&self.db, self.media.as_ref(), user_key, input).await?),
            None => None,
        };

        let name = self
            .provider
            .start_video(&request.prompt, &aspect_ratio, image.as_ref())
            .await?;

        VideoOperationStore::new(&self.db)
            .create(&name, user_key, &request.prompt, &aspect_ratio, self.video_ttl)
            .await?;

        tracing::info!(operation = %name, "Video job started");
        Ok(name)
    }

    /// Poll a video job once, finalizing it into history when it has succeeded.
    #[instrument(skip_all, fields(user_key = %user_key, operation = %name))]
    pub async fn video_status(
        &self,
        user_key: &str,
        name: &str,
    ) -> Result<VideoStatusResponse, AppError> {
        let operations = VideoOperationStore::new(&self.db);
        let handle = operations
            .get_owned(name, user_key)
            .await?
            .ok_or_else(|| AppError::NotFound("Video operation not found".into()))?;

        let output_uri = match self.provider.poll_video(name).await? {
            VideoStatus::Pending => return Ok(VideoStatusResponse::pending()),
            VideoStatus::Failed { message } => {
                tracing::warn!("Video job failed: {}", message);
                operations.delete(name).await?;
                return Ok(VideoStatusResponse::failed(message));
            }
            VideoStatus::Succeeded { output_uri } => output_uri,
        };

        let ledger = HistoryLedger::new(&self.db);
        let id = video_record_id(name);

        // A concurrent poll may have finalized already.
        if let Some(existing) = ledger.get_by_id(&id).await? {
            operations.delete(name).await?;
            return Ok(VideoStatusResponse::succeeded(item_for(existing, None)));
        }

        let media = self.provider.download(&output_uri).await?;
        let extra = serde_json::json!({
            "operationName": name,
            "aspectRatio": handle.aspect_ratio,
        });
        let record = self
            .store_blob(
                id.clone(),
                user_key,
                KIND_VIDEO,
                &handle.prompt,
                &media.bytes,
                &media.mime_type,
                Some(extra),
            )
            .await?;

        let record = if ledger.insert_if_absent(record.clone()).await? {
            tracing::info!(media_id = %id, "Video finalized");
            record
        } else {
            ledger
                .get_by_id(&id)
                .await?
                .ok_or_else(|| AppError::Internal(format!("video record {id} vanished")))?
        };
        operations.delete(name).await?;

        Ok(VideoStatusResponse::succeeded(item_for(record, None)))
    }
}
