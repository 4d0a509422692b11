use std::sync::Arc;

use chrono::Utc;
use common::storage::{MediaKey, MediaStore, extension_for_mime};
use sea_orm::DatabaseConnection;
use tracing::instrument;
use uuid::Uuid;

use super::inputs::resolve_image;
use super::sink::EventSink;
use crate::entity::history_record::{self, KIND_IMAGE};
use crate::error::AppError;
use crate::history::HistoryLedger;
use crate::models::generate::{
    DoneEvent, ErrorEvent, GenerateImageRequest, GeneratedItem, GenerationAction, ItemEvent,
    SkipEvent, StartEvent, StreamEvent,
};
use crate::models::history::media_url;
use crate::state::AppState;
use crate::upstream::{GenOutcome, GenerationProvider, ImagePart};

/// A validated image request with its source images already resolved.
#[derive(Debug, Clone)]
pub struct ImageJob {
    pub user_key: String,
    pub request: GenerateImageRequest,
    pub count: u32,
    images: Vec<ImagePart>,
    mask: Option<ImagePart>,
}

/// Result of a non-streaming run.
#[derive(Debug)]
pub struct BatchOutcome {
    pub items: Vec<GeneratedItem>,
    pub last_text_note: Option<String>,
}

enum Attempt {
    Stored(GeneratedItem),
    Declined(Option<String>),
}

/// Coordinates provider calls with media and ledger persistence.
#[derive(Clone)]
pub struct Orchestrator {
    pub(super) db: DatabaseConnection,
    pub(super) media: Arc<dyn MediaStore>,
    pub(super) provider: Arc<dyn GenerationProvider>,
    pub(super) video_ttl: chrono::Duration,
}

impl Orchestrator {
    pub fn new(
        db: DatabaseConnection,
        media: Arc<dyn MediaStore>,
        provider: Arc<dyn GenerationProvider>,
        video_ttl: chrono::Duration,
    ) -> Self {
        Self {
            db,
            media,
            provider,
            video_ttl,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.db.clone(),
            state.media.clone(),
            state.provider.clone(),
            chrono::Duration::hours(state.config.video.operation_ttl_hours),
        )
    }

    /// Validate a request and load its source images.
    ///
    /// Runs before any output is produced so bad references surface as
    /// ordinary error responses.
    pub async fn prepare(
        &self,
        user_key: &str,
        request: GenerateImageRequest,
    ) -> Result<ImageJob, AppError> {
        request.validate()?;

        let mut images = Vec::with_capacity(request.images.len());
        for input in &request.images {
            images.push(resolve_image(&self.db, self.media.as_ref(), user_key, input).await?);
        }
        let mask = match &request.mask {
            Some(input) => Some(resolve_image(&self.db, self.media.as_ref(), user_key, input).await?),
            None => None,
        };

        Ok(ImageJob {
            user_key: user_key.to_string(),
            count: request.effective_count(),
            request,
            images,
            mask,
        })
    }

    /// Run every attempt and collect the stored images.
    ///
    /// Declines are skipped; the first hard failure aborts the batch.
    /// Artifacts stored before the failure stay in history.
    #[instrument(skip_all, fields(user_key = %job.user_key, count = job.count))]
    pub async fn run_batch(&self, job: &ImageJob) -> Result<BatchOutcome, AppError> {
        let mut items = Vec::new();
        let mut last_text_note = None;

        for index in 0..job.count {
            match self.attempt(job).await? {
                Attempt::Stored(item) => {
                    if item.text_note.is_some() {
                        last_text_note = item.text_note.clone();
                    }
                    items.push(item);
                }
                Attempt::Declined(note) => {
                    tracing::debug!(index, "Provider declined image");
                    if note.is_some() {
                        last_text_note = note;
                    }
                }
            }
        }

        tracing::info!(produced = items.len(), "Image batch finished");
        Ok(BatchOutcome {
            items,
            last_text_note,
        })
    }

    /// Run every attempt, reporting each through `sink` as it completes.
    ///
    /// Emits `start`, one `item` or `skip` per attempt, then `done`. When every
    /// attempt failed outright the final event is `error` instead. Stops early
    /// if the sink closes; stored artifacts are kept either way.
    #[instrument(skip_all, fields(user_key = %job.user_key, count = job.count))]
    pub async fn run_stream(&self, job: &ImageJob, sink: &mut dyn EventSink) {
        let start = StreamEvent::Start(StartEvent {
            requested: job.count,
        });
        if send(sink, start).await.is_err() {
            return;
        }

        let mut produced = 0u32;
        let mut failures = 0u32;
        let mut last_text_note = None;
        let mut last_error = None;

        for index in 0..job.count {
            let event = match self.attempt(job).await {
                Ok(Attempt::Stored(item)) => {
                    produced += 1;
                    if item.text_note.is_some() {
                        last_text_note = item.text_note.clone();
                    }
                    StreamEvent::Item(ItemEvent { index, item })
                }
                Ok(Attempt::Declined(text_note)) => {
                    if text_note.is_some() {
                        last_text_note = text_note.clone();
                    }
                    StreamEvent::Skip(SkipEvent { index, text_note })
                }
                Err(e) => {
                    failures += 1;
                    let message = e.public_message();
                    tracing::warn!(index, "Image attempt failed: {}", message);
                    last_error = Some(message.clone());
                    StreamEvent::Skip(SkipEvent {
                        index,
                        text_note: Some(message),
                    })
                }
            };

            if send(sink, event).await.is_err() {
                tracing::debug!(index, "Stream receiver gone, stopping");
                return;
            }
        }

        let last = if failures == job.count {
            StreamEvent::Error(ErrorEvent {
                message: last_error.unwrap_or_else(|| "Generation failed".into()),
            })
        } else {
            StreamEvent::Done(DoneEvent {
                produced_count: produced,
                last_text_note,
            })
        };
        let _ = send(sink, last).await;
        tracing::info!(produced, failures, "Image stream finished");
    }

    async fn attempt(&self, job: &ImageJob) -> Result<Attempt, AppError> {
        let config = &job.request.image_config;
        let outcome = match job.request.action {
            GenerationAction::Generate => {
                self.provider
                    .generate_from_text(&job.request.prompt, config)
                    .await?
            }
            GenerationAction::Edit => {
                self.provider
                    .edit_image(&job.request.prompt, &job.images, job.mask.as_ref(), config)
                    .await?
            }
        };

        match outcome {
            GenOutcome::Declined { text_note } => Ok(Attempt::Declined(text_note)),
            GenOutcome::Produced {
                bytes,
                mime_type,
                text_note,
            } => {
                let mut extra = serde_json::json!({
                    "action": job.request.action.as_str(),
                    "imageConfig": config,
                });
                if let Some(note) = &text_note {
                    extra["textNote"] = serde_json::Value::String(note.clone());
                }

                let record = self
                    .store_blob(
                        Uuid::now_v7().to_string(),
                        &job.user_key,
                        KIND_IMAGE,
                        &job.request.prompt,
                        &bytes,
                        &mime_type,
                        Some(extra),
                    )
                    .await?;
                HistoryLedger::new(&self.db).insert(record.clone()).await?;

                Ok(Attempt::Stored(item_for(record, text_note)))
            }
        }
    }

    /// Write the bytes to the media store and build the matching ledger row.
    ///
    /// The row is not inserted here; callers pick plain or idempotent insert.
    #[allow(clippy::too_many_arguments)]
    pub(super) async fn store_blob(
        &self,
        id: String,
        user_key: &str,
        kind: &str,
        prompt: &str,
        bytes: &[u8],
        mime_type: &str,
        extra: Option<serde_json::Value>,
    ) -> Result<history_record::Model, AppError> {
        let key = MediaKey::new(user_key, &id, extension_for_mime(mime_type))?;
        self.media.put(&key, bytes, mime_type).await?;

        Ok(history_record::Model {
            id,
            user_key: user_key.to_string(),
            kind: kind.to_string(),
            prompt: prompt.to_string(),
            created_at: Utc::now().timestamp_millis(),
            blob_key: key.as_str().to_string(),
            mime_type: mime_type.to_string(),
            width: None,
            height: None,
            extra,
        })
    }
}

pub(super) fn item_for(record: history_record::Model, text_note: Option<String>) -> GeneratedItem {
    GeneratedItem {
        media_url: media_url(&record.id),
        media_id: record.id,
        mime_type: record.mime_type,
        text_note,
    }
}

async fn send(sink: &mut dyn EventSink, event: StreamEvent) -> Result<(), super::SinkClosed> {
    sink.emit(event.name(), event.payload()).await
}
