use async_trait::async_trait;
use axum::response::sse::Event;
use tokio::sync::mpsc;

/// The receiving side of a stream has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

/// Destination for named streaming events.
#[async_trait]
pub trait EventSink: Send {
    async fn emit(&mut self, event: &str, payload: serde_json::Value) -> Result<(), SinkClosed>;
}

/// Forwards events into the channel backing an SSE response.
pub struct ChannelSink {
    tx: mpsc::Sender<Event>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&mut self, event: &str, payload: serde_json::Value) -> Result<(), SinkClosed> {
        let event = Event::default()
            .event(event)
            .json_data(payload)
            .map_err(|_| SinkClosed)?;
        self.tx.send(event).await.map_err(|_| SinkClosed)
    }
}
