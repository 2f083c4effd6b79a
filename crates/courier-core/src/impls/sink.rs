//! MessageSink の実装
//!
//! - ChannelSink: tokio mpsc チャネルへバッチを流す
//! - CollectingSink: 受け取ったバッチをそのまま保持する

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::domain::{ReceivedMessage, SinkError};
use crate::ports::MessageSink;

/// Forwards each batch to an mpsc channel.
///
/// Uses `send().await`, so a full channel applies backpressure to the cycle.
pub struct ChannelSink {
    tx: mpsc::Sender<Vec<ReceivedMessage>>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Vec<ReceivedMessage>>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving half of a channel holding up to `capacity` batches.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Vec<ReceivedMessage>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn emit(&self, batch: Vec<ReceivedMessage>) -> Result<(), SinkError> {
        self.tx
            .send(batch)
            .await
            .map_err(|_| SinkError::new("receiver dropped"))
    }
}

/// Keeps every emitted batch in memory.
#[derive(Default)]
pub struct CollectingSink {
    batches: Mutex<Vec<Vec<ReceivedMessage>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn batches(&self) -> Vec<Vec<ReceivedMessage>> {
        self.batches.lock().await.clone()
    }

    pub async fn message_count(&self) -> usize {
        self.batches.lock().await.iter().map(Vec::len).sum()
    }
}

#[async_trait]
impl MessageSink for CollectingSink {
    async fn emit(&self, batch: Vec<ReceivedMessage>) -> Result<(), SinkError> {
        self.batches.lock().await.push(batch);
        Ok(())
    }
}
