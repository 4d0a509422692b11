//! Image and video generation flows.
//!
//! The [`Orchestrator`] ties the provider, the media store and the history
//! ledger together. Every artifact is written to the media store before its
//! ledger row, so a listed record always has bytes behind it.

mod inputs;
mod orchestrator;
mod sink;
mod video;

pub use inputs::{decode_inline, resolve_image};
pub use orchestrator::{BatchOutcome, ImageJob, Orchestrator};
pub use sink::{ChannelSink, EventSink, SinkClosed};
pub use video::video_record_id;
