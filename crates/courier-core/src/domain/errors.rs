//! Errors - エラー型と分類
//!
//! # 分類
//! - ConfigurationError: 起動時に検出（start が失敗し、タイマーは一度も起動しない）
//! - ValidationError: サイクルごとに検出（ログに残してそのサイクルだけスキップ）
//! - TransportError: receive / delete の失敗（ログに残して握りつぶす）
//! - SinkError: 下流の失敗（コアでは捕捉せず、ホストへ伝播）

use thiserror::Error;

use super::config::IntervalUnit;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("interval must be greater than zero, got {0}")]
    NonPositiveInterval(i64),

    #[error("interval {interval} {unit:?} overflows a millisecond delay")]
    IntervalOverflow { interval: i64, unit: IntervalUnit },

    #[error("normalized delay {delay_ms}ms exceeds the maximum timer delay of {max_ms}ms")]
    DelayTooLong { delay_ms: u128, max_ms: u128 },
}

/// Option value outside its documented range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("visibilityTimeout must be within [0, 43200], got {0}")]
    VisibilityTimeout(i64),

    #[error("maxNumberOfMessages must be within [1, 10], got {0}")]
    MaxNumberOfMessages(i64),

    #[error("waitTimeSeconds must be within [0, 20], got {0}")]
    WaitTimeSeconds(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("queue not found: {0}")]
    QueueNotFound(String),

    #[error("list queues failed: {0}")]
    ListQueues(String),

    #[error("receive failed: {0}")]
    Receive(String),

    #[error("delete failed: {0}")]
    Delete(String),
}

/// Failure reported by the downstream sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sink failed: {0}")]
pub struct SinkError(pub String);

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
