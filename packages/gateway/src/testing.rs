//! Scripted provider shared by the unit and integration tests.
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::upstream::{
    DownloadedMedia, GenOutcome, GenerationProvider, ImageConfig, ImagePart, UpstreamError,
    VideoStatus,
};

pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";
pub const FAKE_MP4: &[u8] = b"\x00\x00\x00\x18ftypmp42";

/// What the fake provider does on its next image call.
pub enum Step {
    Image,
    /// An image accompanied by a text note.
    Noted(&'static str),
    Decline(&'static str),
    Fail,
}

/// Image calls consume [`Step`]s and produce a plain image once the script
/// runs out. Video jobs stay pending until [`FakeProvider::set_video`] moves them.
#[derive(Default)]
pub struct FakeProvider {
    steps: Mutex<VecDeque<Step>>,
    image_calls: AtomicUsize,
    edit_inputs: Mutex<Vec<ImagePart>>,
    videos: Mutex<HashMap<String, VideoStatus>>,
    next_video: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeProvider {
    pub fn with_steps(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            ..Default::default()
        }
    }

    /// Queue more steps behind whatever is left.
    pub fn script(&self, steps: Vec<Step>) {
        lock(&self.steps).extend(steps);
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    /// Source images passed to the most recent edit call.
    pub fn edit_inputs(&self) -> Vec<ImagePart> {
        lock(&self.edit_inputs).clone()
    }

    pub fn set_video(&self, name: &str, status: VideoStatus) {
        lock(&self.videos).insert(name.to_string(), status);
    }

    pub fn finish_video(&self, name: &str) {
        self.set_video(
            name,
            VideoStatus::Succeeded {
                output_uri: format!("fake://{name}"),
            },
        );
    }

    pub fn fail_video(&self, name: &str, message: &str) {
        self.set_video(
            name,
            VideoStatus::Failed {
                message: message.to_string(),
            },
        );
    }

    fn next_image(&self) -> Result<GenOutcome, UpstreamError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        let step = lock(&self.steps).pop_front().unwrap_or(Step::Image);
        let produced = |text_note: Option<String>| GenOutcome::Produced {
            bytes: FAKE_PNG.to_vec(),
            mime_type: "image/png".into(),
            text_note,
        };
        match step {
            Step::Image => Ok(produced(None)),
            Step::Noted(note) => Ok(produced(Some(note.to_string()))),
            Step::Decline(note) => Ok(GenOutcome::Declined {
                text_note: Some(note.to_string()),
            }),
            Step::Fail => Err(UpstreamError::Status {
                status: 503,
                body: "overloaded".into(),
            }),
        }
    }
}

#[async_trait]
impl GenerationProvider for FakeProvider {
    async fn generate_from_text(
        &self,
        _prompt: &str,
        _config: &ImageConfig,
    ) -> Result<GenOutcome, UpstreamError> {
        self.next_image()
    }

    async fn edit_image(
        &self,
        _prompt: &str,
        images: &[ImagePart],
        _mask: Option<&ImagePart>,
        _config: &ImageConfig,
    ) -> Result<GenOutcome, UpstreamError> {
        *lock(&self.edit_inputs) = images.to_vec();
        self.next_image()
    }

    async fn start_video(
        &self,
        _prompt: &str,
        _aspect_ratio: &str,
        _image: Option<&ImagePart>,
    ) -> Result<String, UpstreamError> {
        let n = self.next_video.fetch_add(1, Ordering::SeqCst);
        let name = format!("models/fake-video/operations/op{n}");
        self.set_video(&name, VideoStatus::Pending);
        Ok(name)
    }

    async fn poll_video(&self, operation_name: &str) -> Result<VideoStatus, UpstreamError> {
        lock(&self.videos)
            .get(operation_name)
            .cloned()
            .ok_or(UpstreamError::MissingHandle)
    }

    async fn download(&self, _uri: &str) -> Result<DownloadedMedia, UpstreamError> {
        Ok(DownloadedMedia {
            bytes: FAKE_MP4.to_vec(),
            mime_type: "video/mp4".into(),
        })
    }
}
