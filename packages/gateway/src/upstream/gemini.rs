use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Value, json};
use tracing::instrument;

use super::{
    DownloadedMedia, GenOutcome, GenerationProvider, ImageConfig, ImagePart, UpstreamError,
    VideoStatus,
};
use crate::config::UpstreamConfig;

/// Longest provider error body echoed back in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Client for the Gemini image and Veo video endpoints.
pub struct GeminiClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl GeminiClient {
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url())
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(UpstreamError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, UpstreamError> {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json::<Value>().await?)
    }

    async fn generate_content(&self, body: Value) -> Result<GenOutcome, UpstreamError> {
        let url = self.model_url(&self.config.image_model, "generateContent");
        let response = self.post_json(&url, &body).await?;
        parse_image_response(&response)
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    #[instrument(skip_all)]
    async fn generate_from_text(
        &self,
        prompt: &str,
        config: &ImageConfig,
    ) -> Result<GenOutcome, UpstreamError> {
        self.generate_content(image_request_body(prompt, &[], None, config))
            .await
    }

    #[instrument(skip_all, fields(images = images.len(), mask = mask.is_some()))]
    async fn edit_image(
        &self,
        prompt: &str,
        images: &[ImagePart],
        mask: Option<&ImagePart>,
        config: &ImageConfig,
    ) -> Result<GenOutcome, UpstreamError> {
        self.generate_content(image_request_body(prompt, images, mask, config))
            .await
    }

    #[instrument(skip_all, fields(aspect_ratio = %aspect_ratio, with_image = image.is_some()))]
    async fn start_video(
        &self,
        prompt: &str,
        aspect_ratio: &str,
        image: Option<&ImagePart>,
    ) -> Result<String, UpstreamError> {
        let url = self.model_url(&self.config.video_model, "predictLongRunning");
        let response = self
            .post_json(&url, &video_request_body(prompt, aspect_ratio, image))
            .await?;
        parse_operation_name(&response)
    }

    #[instrument(skip(self))]
    async fn poll_video(&self, operation_name: &str) -> Result<VideoStatus, UpstreamError> {
        let url = format!("{}/{}", self.base_url(), operation_name);
        let response = self
            .http
            .get(url)
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await?;
        let body = Self::check(response).await?.json::<Value>().await?;
        parse_video_status(&body)
    }

    #[instrument(skip_all)]
    async fn download(&self, uri: &str) -> Result<DownloadedMedia, UpstreamError> {
        let response = self
            .http
            .get(uri)
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("video/"))
            .unwrap_or("video/mp4")
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        Ok(DownloadedMedia { bytes, mime_type })
    }
}

fn inline_part(image: &ImagePart) -> Value {
    json!({
        "inlineData": {
            "mimeType": image.mime_type,
            "data": STANDARD.encode(&image.bytes),
        }
    })
}

/// Build a `generateContent` body.
///
/// Part order is fixed: the text prompt, then every source image in order,
/// then the mask. The model reads the last image as the mask.
pub(crate) fn image_request_body(
    prompt: &str,
    images: &[ImagePart],
    mask: Option<&ImagePart>,
    config: &ImageConfig,
) -> Value {
    let mut parts = Vec::with_capacity(images.len() + 2);
    parts.push(json!({ "text": prompt }));
    parts.extend(images.iter().map(inline_part));
    if let Some(mask) = mask {
        parts.push(inline_part(mask));
    }

    let mut image_config = Map::new();
    if let Some(ratio) = &config.aspect_ratio {
        image_config.insert("aspectRatio".into(), json!(ratio));
    }
    if let Some(size) = &config.image_size {
        image_config.insert("imageSize".into(), json!(size));
    }

    let mut generation_config = Map::new();
    generation_config.insert("responseModalities".into(), json!(["TEXT", "IMAGE"]));
    if !image_config.is_empty() {
        generation_config.insert("imageConfig".into(), Value::Object(image_config));
    }

    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": generation_config,
    })
}

fn field<'a>(value: &'a Value, camel: &str, snake: &str) -> Option<&'a Value> {
    value.get(camel).or_else(|| value.get(snake))
}

/// Turn a `generateContent` response into an outcome.
///
/// The first inline image wins; all text parts are joined into the note.
pub(crate) fn parse_image_response(body: &Value) -> Result<GenOutcome, UpstreamError> {
    if !body.is_object() {
        return Err(UpstreamError::Malformed("response is not an object".into()));
    }

    if let Some(reason) = body
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Ok(GenOutcome::Declined {
            text_note: Some(format!("Request blocked: {reason}")),
        });
    }

    let Some(candidate) = body
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
    else {
        return Ok(GenOutcome::Declined { text_note: None });
    };

    let empty = Vec::new();
    let parts = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let mut image: Option<(Vec<u8>, String)> = None;
    let mut texts = Vec::new();
    for part in parts {
        if let Some(inline) = field(part, "inlineData", "inline_data") {
            if image.is_some() {
                continue;
            }
            let data = inline
                .get("data")
                .and_then(Value::as_str)
                .ok_or_else(|| UpstreamError::Malformed("inline image without data".into()))?;
            let bytes = STANDARD
                .decode(data)
                .map_err(|e| UpstreamError::Malformed(format!("bad image base64: {e}")))?;
            let mime_type = field(inline, "mimeType", "mime_type")
                .and_then(Value::as_str)
                .unwrap_or("image/png")
                .to_string();
            image = Some((bytes, mime_type));
        } else if let Some(text) = part.get("text").and_then(Value::as_str) {
            let text = text.trim();
            if !text.is_empty() {
                texts.push(text.to_string());
            }
        }
    }

    let mut text_note = (!texts.is_empty()).then(|| texts.join("\n"));

    match image {
        Some((bytes, mime_type)) => Ok(GenOutcome::Produced {
            bytes,
            mime_type,
            text_note,
        }),
        None => {
            if text_note.is_none()
                && let Some(reason) = field(candidate, "finishReason", "finish_reason")
                    .and_then(Value::as_str)
                    .filter(|r| *r != "STOP")
            {
                text_note = Some(format!("Generation stopped: {reason}"));
            }
            Ok(GenOutcome::Declined { text_note })
        }
    }
}

pub(crate) fn video_request_body(
    prompt: &str,
    aspect_ratio: &str,
    image: Option<&ImagePart>,
) -> Value {
    let mut instance = Map::new();
    instance.insert("prompt".into(), json!(prompt));
    if let Some(image) = image {
        instance.insert(
            "image".into(),
            json!({
                "bytesBase64Encoded": STANDARD.encode(&image.bytes),
                "mimeType": image.mime_type,
            }),
        );
    }

    json!({
        "instances": [Value::Object(instance)],
        "parameters": { "aspectRatio": aspect_ratio },
    })
}

pub(crate) fn parse_operation_name(body: &Value) -> Result<String, UpstreamError> {
    body.get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or(UpstreamError::MissingHandle)
}

pub(crate) fn parse_video_status(body: &Value) -> Result<VideoStatus, UpstreamError> {
    if !body.is_object() {
        return Err(UpstreamError::Malformed("operation is not an object".into()));
    }

    if !body.get("done").and_then(Value::as_bool).unwrap_or(false) {
        return Ok(VideoStatus::Pending);
    }

    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Video generation failed")
            .to_string();
        return Ok(VideoStatus::Failed { message });
    }

    let uri = body
        .pointer("/response/generateVideoResponse/generatedSamples/0/video/uri")
        .or_else(|| body.pointer("/response/videos/0/uri"))
        .and_then(Value::as_str);

    if let Some(uri) = uri {
        return Ok(VideoStatus::Succeeded {
            output_uri: uri.to_string(),
        });
    }

    let filtered: Vec<&str> = body
        .pointer("/response/generateVideoResponse/raiMediaFilteredReasons")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let message = if filtered.is_empty() {
        "Provider returned no video".to_string()
    } else {
        filtered.join("; ")
    };
    Ok(VideoStatus::Failed { message })
}
