//! Adapter for the external generative media provider.
//!
//! The gateway talks to the provider only through [`GenerationProvider`], which
//! is constructed once at startup and injected into [`crate::state::AppState`].

mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gemini::GeminiClient;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    Malformed(String),

    #[error("Provider did not return an operation handle")]
    MissingHandle,
}

/// A binary image handed to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Output shaping options forwarded to the image model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    /// Requested aspect ratio, e.g. "1:1" or "16:9".
    #[schema(example = "1:1")]
    pub aspect_ratio: Option<String>,
    /// Requested output size class, e.g. "1K" or "2K".
    #[schema(example = "1K")]
    pub image_size: Option<String>,
}

/// Result of a single image call.
///
/// A declined request is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenOutcome {
    Produced {
        bytes: Vec<u8>,
        mime_type: String,
        text_note: Option<String>,
    },
    Declined {
        text_note: Option<String>,
    },
}

/// Snapshot of a long-running video job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoStatus {
    Pending,
    Failed { message: String },
    Succeeded { output_uri: String },
}

/// A downloaded provider artifact.
#[derive(Debug, Clone)]
pub struct DownloadedMedia {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate_from_text(
        &self,
        prompt: &str,
        config: &ImageConfig,
    ) -> Result<GenOutcome, UpstreamError>;

    /// Edit or compose from source images, optionally constrained by a mask.
    async fn edit_image(
        &self,
        prompt: &str,
        images: &[ImagePart],
        mask: Option<&ImagePart>,
        config: &ImageConfig,
    ) -> Result<GenOutcome, UpstreamError>;

    /// Start a video job and return its operation name.
    async fn start_video(
        &self,
        prompt: &str,
        aspect_ratio: &str,
        image: Option<&ImagePart>,
    ) -> Result<String, UpstreamError>;

    /// One non-blocking status check.
    async fn poll_video(&self, operation_name: &str) -> Result<VideoStatus, UpstreamError>;

    async fn download(&self, uri: &str) -> Result<DownloadedMedia, UpstreamError>;
}
