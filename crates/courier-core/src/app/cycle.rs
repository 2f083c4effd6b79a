//! CycleExecutor - 1 サイクル分の receive → deliver → delete
//!
//! # フロー
//! 1. PollConfig から ReceiveRequest を組み立てる（オプションの範囲チェックは毎サイクル）
//! 2. QueueTransport::receive_messages()
//! 3. 0 件なら何もしない
//! 4. MessageSink::emit() でバッチごと下流へ渡す
//! 5. delete_messages が有効なら 1 件は delete_message、2 件以上は delete_message_batch
//!
//! validation / transport のエラーはここでログに残して CycleOutcome に畳み込みます。
//! sink のエラーだけは捕捉せずに呼び出し側へ返します。

use std::sync::Arc;

use crate::app::status::PollStats;
use crate::domain::{
    CycleOutcome, DeleteBatch, PollConfig, ReceiveRequest, SinkError, TransportError,
};
use crate::ports::{MessageSink, QueueTransport};

pub struct CycleExecutor {
    config: Arc<PollConfig>,
    transport: Arc<dyn QueueTransport>,
    sink: Arc<dyn MessageSink>,
    stats: Arc<PollStats>,
}

impl CycleExecutor {
    pub fn new(
        config: Arc<PollConfig>,
        transport: Arc<dyn QueueTransport>,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            config,
            transport,
            sink,
            stats: Arc::new(PollStats::default()),
        }
    }

    /// Report outcomes into `stats` instead of a private counter set.
    pub fn with_stats(mut self, stats: Arc<PollStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn stats(&self) -> &Arc<PollStats> {
        &self.stats
    }

    /// Run one cycle.
    ///
    /// Returns `Ok` for every outcome the cycle handles itself, including
    /// failed receives and deletes. `Err` means the sink rejected the batch.
    pub async fn execute(&self) -> Result<CycleOutcome, SinkError> {
        let outcome = self.run().await?;
        self.stats.record_outcome(&outcome);
        Ok(outcome)
    }

    async fn run(&self) -> Result<CycleOutcome, SinkError> {
        let queue = self.config.queue.as_str();

        let request = match ReceiveRequest::from_config(&self.config) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(queue, error = %err, "invalid receive options, skipping cycle");
                return Ok(CycleOutcome::Invalid(err));
            }
        };

        let messages = match self.transport.receive_messages(&request).await {
            Ok(messages) => messages,
            Err(err) => {
                tracing::error!(queue, error = %err, "receive failed");
                return Ok(CycleOutcome::ReceiveFailed(err));
            }
        };

        if messages.is_empty() {
            tracing::trace!(queue, "no messages");
            return Ok(CycleOutcome::Empty);
        }

        let count = messages.len();
        let delete_batch = if self.config.options.delete_messages {
            DeleteBatch::from_messages(&messages)
        } else {
            None
        };

        tracing::debug!(queue, count, "delivering messages");
        self.sink.emit(messages).await?;

        let deleted = match delete_batch {
            Some(batch) => Some(self.delete(batch).await),
            None => None,
        };

        Ok(CycleOutcome::Delivered { count, deleted })
    }

    /// Returns whether the delete call succeeded.
    async fn delete(&self, batch: DeleteBatch) -> bool {
        let queue = self.config.queue.as_str();
        let count = batch.len();

        let result: Result<(), TransportError> = match &batch {
            DeleteBatch::Single { receipt_handle } => {
                self.transport.delete_message(queue, receipt_handle).await
            }
            DeleteBatch::Batch(entries) => {
                self.transport.delete_message_batch(queue, entries).await
            }
        };

        match result {
            Ok(()) => {
                tracing::debug!(queue, count, "deleted messages");
                true
            }
            Err(err) => {
                // Messages were already delivered; they reappear after the
                // visibility timeout.
                tracing::error!(queue, count, error = %err, "delete failed");
                false
            }
        }
    }
}
