//! PollerBuilder - ポーラーの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: interval の検証は build() で行い、タイマーは起動しない
//! - 開発体験の改善（明確なエラーメッセージ）

use std::sync::Arc;

use crate::app::cycle::CycleExecutor;
use crate::app::scheduler::{PollHandle, PollScheduler};
use crate::app::status::PollStats;
use crate::domain::{ConfigurationError, CycleOutcome, PollConfig, SinkError};
use crate::ports::{MessageSink, QueueTransport};

/// PollerBuilder はポーラーを構築
///
/// # 使用例
/// ```ignore
/// let poller = PollerBuilder::new(config)
///     .transport(transport)
///     .sink(sink)
///     .build()?;
/// let handle = poller.start();
/// // ...
/// handle.stop_and_wait().await?;
/// ```
pub struct PollerBuilder {
    config: PollConfig,
    transport: Option<Arc<dyn QueueTransport>>,
    sink: Option<Arc<dyn MessageSink>>,
}

/// BuildError はポーラー構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no queue transport configured. Call .transport() before .build().")]
    MissingTransport,

    #[error("no message sink configured. Call .sink() before .build().")]
    MissingSink,

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl PollerBuilder {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            transport: None,
            sink: None,
        }
    }

    pub fn transport(mut self, transport: Arc<dyn QueueTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn MessageSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Poller を生成
    ///
    /// # 検証
    /// - transport / sink が設定されているか
    /// - interval が正で、タイマーの上限を超えないか
    pub fn build(self) -> Result<Poller, BuildError> {
        let transport = self.transport.ok_or(BuildError::MissingTransport)?;
        let sink = self.sink.ok_or(BuildError::MissingSink)?;

        let stats = Arc::new(PollStats::default());
        let scheduler = PollScheduler::new(&self.config)?.with_stats(Arc::clone(&stats));
        let executor = CycleExecutor::new(Arc::new(self.config), transport, sink).with_stats(stats);

        Ok(Poller {
            scheduler,
            executor: Arc::new(executor),
        })
    }
}

/// A wired poller that has not started yet.
pub struct Poller {
    scheduler: PollScheduler,
    executor: Arc<CycleExecutor>,
}

impl Poller {
    pub fn config(&self) -> &PollConfig {
        self.executor.config()
    }

    /// Delay between the end of one cycle and the start of the next.
    pub fn delay(&self) -> std::time::Duration {
        self.scheduler.delay()
    }

    /// Run a single cycle now, without scheduling.
    pub async fn run_once(&self) -> Result<CycleOutcome, SinkError> {
        self.executor.execute().await
    }

    /// Start polling. Must be called from within a tokio runtime.
    pub fn start(self) -> PollHandle {
        let executor = self.executor;
        self.scheduler.spawn(move || {
            let executor = Arc::clone(&executor);
            async move { executor.execute().await }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeleteBatchEntry, IntervalUnit, PollOptions, ReceivedMessage, TransportError};
    use crate::impls::CollectingSink;
    use crate::impls::scripted::{Call, ScriptedTransport};
    use std::time::Duration;

    fn build(
        config: PollConfig,
        transport: &Arc<ScriptedTransport>,
        sink: &Arc<CollectingSink>,
    ) -> Poller {
        PollerBuilder::new(config)
            .transport(transport.clone())
            .sink(sink.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_missing_transport() {
        let result = PollerBuilder::new(PollConfig::new("q", 1, IntervalUnit::Seconds))
            .sink(Arc::new(CollectingSink::new()))
            .build();
        assert!(matches!(result, Err(BuildError::MissingTransport)));
    }

    #[test]
    fn test_build_missing_sink() {
        let result = PollerBuilder::new(PollConfig::new("q", 1, IntervalUnit::Seconds))
            .transport(Arc::new(ScriptedTransport::new()))
            .build();
        assert!(matches!(result, Err(BuildError::MissingSink)));
    }

    #[test]
    fn test_build_rejects_zero_interval() {
        let result = PollerBuilder::new(PollConfig::new("q", 0, IntervalUnit::Minutes))
            .transport(Arc::new(ScriptedTransport::new()))
            .sink(Arc::new(CollectingSink::new()))
            .build();
        assert!(matches!(
            result,
            Err(BuildError::Configuration(ConfigurationError::NonPositiveInterval(0)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn minute_interval_batch_delete_scenario() {
        let transport = Arc::new(ScriptedTransport::new());
        let sink = Arc::new(CollectingSink::new());
        transport.push_messages(vec![
            ReceivedMessage::new("a", "rh-a"),
            ReceivedMessage::new("b", "rh-b"),
            ReceivedMessage::new("c", "rh-c"),
        ]);
        let config = PollConfig::new("orders", 1, IntervalUnit::Minutes).with_options(PollOptions {
            delete_messages: true,
            max_number_of_messages: Some(5),
            ..Default::default()
        });

        let poller = build(config, &transport, &sink);
        assert_eq!(poller.delay(), Duration::from_millis(60_000));

        let handle = poller.start();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let batches = sink.batches().await;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(
            transport.delete_calls(),
            vec![Call::DeleteBatch {
                queue: "orders".into(),
                entries: vec![
                    DeleteBatchEntry { id: "msg1".into(), receipt_handle: "rh-a".into() },
                    DeleteBatchEntry { id: "msg2".into(), receipt_handle: "rh-b".into() },
                    DeleteBatchEntry { id: "msg3".into(), receipt_handle: "rh-c".into() },
                ],
            }]
        );

        handle.stop_and_wait().await.unwrap();
    }

    #[test]
    fn long_poll_wait_stretches_short_interval() {
        let transport = Arc::new(ScriptedTransport::new());
        let sink = Arc::new(CollectingSink::new());
        let config = PollConfig::new("orders", 1, IntervalUnit::Seconds).with_options(PollOptions {
            wait_time_seconds: Some(20),
            ..Default::default()
        });

        let poller = build(config, &transport, &sink);
        assert_eq!(poller.delay(), Duration::from_millis(20_000));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_visibility_timeout_skips_receive_but_keeps_polling() {
        let transport = Arc::new(ScriptedTransport::new());
        let sink = Arc::new(CollectingSink::new());
        let config = PollConfig::new("orders", 1, IntervalUnit::Seconds).with_options(PollOptions {
            visibility_timeout: Some(50_000),
            ..Default::default()
        });

        let handle = build(config, &transport, &sink).start();
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        assert_eq!(transport.receive_count(), 0);
        let stats = handle.stats();
        assert_eq!(stats.validation_failures, 3);
        assert!(handle.is_running());

        handle.stop_and_wait().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn receive_failure_does_not_stop_schedule() {
        let transport = Arc::new(ScriptedTransport::new());
        let sink = Arc::new(CollectingSink::new());
        transport.push_failure(TransportError::Receive("503".into()));
        transport.push_messages(vec![ReceivedMessage::new("late", "rh-late")]);
        let config = PollConfig::new("orders", 5, IntervalUnit::Seconds);

        let handle = build(config, &transport, &sink).start();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(transport.receive_count(), 1);
        assert!(sink.batches().await.is_empty());

        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(transport.receive_count(), 2);
        assert_eq!(sink.message_count().await, 1);
        assert_eq!(handle.stats().receive_failures, 1);

        handle.stop_and_wait().await.unwrap();
    }

    #[tokio::test]
    async fn run_once_executes_single_cycle() {
        let transport = Arc::new(ScriptedTransport::new());
        let sink = Arc::new(CollectingSink::new());
        transport.push_messages(vec![ReceivedMessage::new("x", "rh-x")]);

        let poller = build(PollConfig::new("orders", 30, IntervalUnit::Seconds), &transport, &sink);
        let outcome = poller.run_once().await.unwrap();

        assert_eq!(outcome.delivered_count(), 1);
        assert_eq!(transport.receive_count(), 1);
    }
}
