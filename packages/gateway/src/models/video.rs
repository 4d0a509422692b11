use serde::{Deserialize, Serialize};

use super::generate::{GeneratedItem, ImageInput};

/// Aspect ratio used when the request leaves it out.
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";

/// Request body for starting a video job.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartVideoRequest {
    #[schema(example = "waves rolling onto a beach at sunrise")]
    pub prompt: String,
    /// "16:9" or "9:16". Default: "16:9".
    #[schema(example = "16:9")]
    pub aspect_ratio: Option<String>,
    /// Optional first frame.
    pub image: Option<ImageInput>,
}

pub fn validate_aspect_ratio(ratio: &str) -> bool {
    matches!(ratio, "16:9" | "9:16")
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartVideoResponse {
    #[schema(example = "models/veo-3.0-generate-001/operations/abc123")]
    pub operation_name: String,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VideoStatusQuery {
    /// Operation name returned by `/api/video/start`.
    pub name: String,
}

/// Current state of a video job.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VideoStatusResponse {
    pub done: bool,
    /// Provider error message for a failed job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The finalized artifact for a successful job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<GeneratedItem>,
}

impl VideoStatusResponse {
    pub fn pending() -> Self {
        Self {
            done: false,
            error: None,
            item: None,
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            done: true,
            error: Some(message),
            item: None,
        }
    }

    pub fn succeeded(item: GeneratedItem) -> Self {
        Self {
            done: true,
            error: None,
            item: Some(item),
        }
    }
}
