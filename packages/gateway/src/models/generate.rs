use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::upstream::ImageConfig;

/// Upper bound on images produced by one request.
pub const MAX_COUNT: i64 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenerationAction {
    /// Text-to-image.
    #[default]
    Generate,
    /// Edit or compose from one or more source images.
    Edit,
}

impl GenerationAction {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationAction::Generate => "generate",
            GenerationAction::Edit => "edit",
        }
    }
}

/// A source image, either uploaded inline or taken from the caller's history.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum ImageInput {
    Reference {
        #[serde(rename = "historyId")]
        history_id: String,
    },
    Inline {
        #[serde(rename = "mimeType")]
        mime_type: String,
        /// Base64 payload. A `data:` URL is accepted too.
        data: String,
    },
}

/// Request body for `/api/generate/image`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub action: GenerationAction,
    #[schema(example = "a lighthouse at dusk, watercolor")]
    pub prompt: String,
    /// Number of images to attempt, clamped to 1-5. Default: 1.
    #[schema(example = 2)]
    pub count: Option<i64>,
    /// Stream results as server-sent events.
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub image_config: ImageConfig,
    /// Source images for `edit`.
    #[serde(default)]
    pub images: Vec<ImageInput>,
    /// Optional mask for `edit`.
    pub mask: Option<ImageInput>,
}

impl GenerateImageRequest {
    /// Requested count clamped into `[1, MAX_COUNT]`.
    pub fn effective_count(&self) -> u32 {
        self.count.unwrap_or(1).clamp(1, MAX_COUNT) as u32
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.prompt.trim().is_empty() {
            return Err(AppError::Validation("Prompt must not be empty".into()));
        }
        match self.action {
            GenerationAction::Edit if self.images.is_empty() => Err(AppError::Validation(
                "Edit requires at least one source image".into(),
            )),
            GenerationAction::Generate if !self.images.is_empty() || self.mask.is_some() => {
                Err(AppError::Validation(
                    "Source images are only accepted for edit".into(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// A single stored artifact as returned from generation endpoints.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedItem {
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub media_id: String,
    #[schema(example = "/api/media/01936f0e-1234-7abc-8000-000000000001")]
    pub media_url: String,
    #[schema(example = "image/png")]
    pub mime_type: String,
    /// Accompanying text from the model, if any.
    pub text_note: Option<String>,
}

/// Response body for non-streaming generation.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    /// False when no image was produced.
    pub ok: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<GeneratedItem>,
    /// Last text note seen across all attempts.
    pub text_note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartEvent {
    pub requested: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemEvent {
    pub index: u32,
    #[serde(flatten)]
    pub item: GeneratedItem,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipEvent {
    pub index: u32,
    pub text_note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoneEvent {
    pub produced_count: u32,
    pub last_text_note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorEvent {
    pub message: String,
}

/// One server-sent event of a streaming generation.
#[derive(Debug)]
pub enum StreamEvent {
    Start(StartEvent),
    Item(ItemEvent),
    Skip(SkipEvent),
    Done(DoneEvent),
    Error(ErrorEvent),
}

impl StreamEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Start(_) => "start",
            StreamEvent::Item(_) => "item",
            StreamEvent::Skip(_) => "skip",
            StreamEvent::Done(_) => "done",
            StreamEvent::Error(_) => "error",
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        let value = match self {
            StreamEvent::Start(e) => serde_json::to_value(e),
            StreamEvent::Item(e) => serde_json::to_value(e),
            StreamEvent::Skip(e) => serde_json::to_value(e),
            StreamEvent::Done(e) => serde_json::to_value(e),
            StreamEvent::Error(e) => serde_json::to_value(e),
        };
        value.unwrap_or_default()
    }
}
