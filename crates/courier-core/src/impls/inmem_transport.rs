//! InMemoryQueueTransport - 開発用のキュー
//!
//! # 学習ポイント
//! - visibility timeout の再現（受信済みメッセージは一定時間だけ不可視）
//! - Mutex + Notify による long polling
//! - receipt handle は受信のたびに発行し直す（古い handle では削除できない）

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use ulid::Ulid;

use crate::domain::request::ALL_ATTRIBUTES;
use crate::domain::{DeleteBatchEntry, ReceiveRequest, ReceivedMessage, TransportError};
use crate::ports::{QueueDescriptor, QueueTransport};

/// Visibility timeout applied when the request does not set one.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Message count returned when the request does not set one.
pub const DEFAULT_MAX_NUMBER_OF_MESSAGES: usize = 1;

const URL_SCHEME: &str = "memory://";

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
    sent_at_ms: i64,
    receive_count: u32,
    /// Hidden from receivers until this instant.
    invisible_until: Option<Instant>,
    /// Handle issued by the most recent receive.
    receipt_handle: Option<String>,
}

impl StoredMessage {
    fn is_visible(&self, now: Instant) -> bool {
        self.invisible_until.is_none_or(|until| until <= now)
    }
}

#[derive(Debug, Default)]
struct QueueState {
    messages: VecDeque<StoredMessage>,
}

impl QueueState {
    /// Hand out up to `max` visible messages in queue order.
    fn take_visible(
        &mut self,
        max: usize,
        visibility: Duration,
        with_attributes: bool,
        now: Instant,
    ) -> Vec<ReceivedMessage> {
        let mut received = Vec::new();
        for stored in self.messages.iter_mut() {
            if received.len() >= max {
                break;
            }
            if !stored.is_visible(now) {
                continue;
            }

            // Shaped like a real handle so encoding actually matters.
            let receipt_handle = format!(
                "{}+{}/{}==",
                stored.message_id,
                Ulid::new(),
                stored.receive_count
            );
            stored.receive_count += 1;
            stored.invisible_until = Some(now + visibility);
            stored.receipt_handle = Some(receipt_handle.clone());

            let mut message = ReceivedMessage::new(stored.body.clone(), receipt_handle)
                .with_message_id(stored.message_id.clone());
            if with_attributes {
                message = message
                    .with_attribute("SentTimestamp", stored.sent_at_ms.to_string())
                    .with_attribute("ApproximateReceiveCount", stored.receive_count.to_string());
            }
            received.push(message);
        }
        received
    }

    /// Earliest instant at which a hidden message becomes visible again.
    fn next_visible_at(&self) -> Option<Instant> {
        self.messages.iter().filter_map(|m| m.invisible_until).min()
    }

    fn delete(&mut self, receipt_handle: &str) -> bool {
        let before = self.messages.len();
        self.messages
            .retain(|m| m.receipt_handle.as_deref() != Some(receipt_handle));
        self.messages.len() != before
    }
}

/// InMemoryQueueTransport は開発用の QueueTransport
///
/// # 実装詳細
/// - BTreeMap<String, QueueState> で名前ごとにキューを管理
/// - queue 参照は名前でも `memory://<name>` でもよい
/// - delete は percent-encoded な receipt handle を受け取り、デコードして照合する
///
/// # 使用例
/// ```ignore
/// let transport = InMemoryQueueTransport::new();
/// transport.create_queue("orders").await;
/// transport.send_message("orders", "hello").await?;
/// ```
#[derive(Default)]
pub struct InMemoryQueueTransport {
    queues: Arc<Mutex<BTreeMap<String, QueueState>>>,
    /// send 時の通知用
    notify: Arc<Notify>,
}

impl InMemoryQueueTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the queue if it does not exist yet. Accepts a name or a `memory://` url.
    pub async fn create_queue(&self, queue: &str) -> QueueDescriptor {
        let name = queue_name(queue);
        self.queues
            .lock()
            .await
            .entry(name.to_string())
            .or_default();
        descriptor(name)
    }

    /// Append a message and wake any long-polling receivers. Returns the message id.
    pub async fn send_message(
        &self,
        queue: &str,
        body: impl Into<String>,
    ) -> Result<String, TransportError> {
        let message_id = Ulid::new().to_string();
        {
            let mut queues = self.queues.lock().await;
            let state = queues
                .get_mut(queue_name(queue))
                .ok_or_else(|| TransportError::QueueNotFound(queue.to_string()))?;
            state.messages.push_back(StoredMessage {
                message_id: message_id.clone(),
                body: body.into(),
                sent_at_ms: Utc::now().timestamp_millis(),
                receive_count: 0,
                invisible_until: None,
                receipt_handle: None,
            });
        }
        // Notify outside the lock
        self.notify.notify_waiters();
        Ok(message_id)
    }

    /// Messages currently stored in `queue`, visible or not.
    pub async fn depth(&self, queue: &str) -> Result<usize, TransportError> {
        let queues = self.queues.lock().await;
        queues
            .get(queue_name(queue))
            .map(|state| state.messages.len())
            .ok_or_else(|| TransportError::QueueNotFound(queue.to_string()))
    }
}

#[async_trait]
impl QueueTransport for InMemoryQueueTransport {
    async fn list_queues(&self, prefix: Option<&str>) -> Result<Vec<QueueDescriptor>, TransportError> {
        let queues = self.queues.lock().await;
        Ok(queues
            .keys()
            .filter(|name| prefix.is_none_or(|p| name.starts_with(p)))
            .map(|name| descriptor(name))
            .collect())
    }

    async fn receive_messages(
        &self,
        request: &ReceiveRequest,
    ) -> Result<Vec<ReceivedMessage>, TransportError> {
        let max = request
            .max_number_of_messages
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_NUMBER_OF_MESSAGES);
        let visibility = request
            .visibility_timeout
            .map(|secs| Duration::from_secs(secs.into()))
            .unwrap_or(DEFAULT_VISIBILITY_TIMEOUT);
        let wait = Duration::from_secs(request.wait_time_seconds.unwrap_or(0).into());
        let with_attributes = request.attribute_names.iter().any(|a| a == ALL_ATTRIBUTES);
        let deadline = Instant::now() + wait;

        loop {
            // Register before checking so a send between check and wait is not lost.
            let notified = self.notify.notified();

            let next_visible_at = {
                let mut queues = self.queues.lock().await;
                let state = queues
                    .get_mut(queue_name(&request.queue))
                    .ok_or_else(|| TransportError::QueueNotFound(request.queue.clone()))?;

                let now = Instant::now();
                let received = state.take_visible(max, visibility, with_attributes, now);
                if !received.is_empty() || now >= deadline {
                    return Ok(received);
                }
                state.next_visible_at()
            };

            let wake_at = next_visible_at.map_or(deadline, |at| at.min(deadline));
            tokio::select! {
                _ = notified => {},
                _ = tokio::time::sleep_until(wake_at) => {},
            }
        }
    }

    async fn delete_message(&self, queue: &str, receipt_handle: &str) -> Result<(), TransportError> {
        let handle = decode(receipt_handle)?;
        let mut queues = self.queues.lock().await;
        let state = queues
            .get_mut(queue_name(queue))
            .ok_or_else(|| TransportError::QueueNotFound(queue.to_string()))?;

        if state.delete(&handle) {
            Ok(())
        } else {
            Err(TransportError::Delete(format!(
                "receipt handle is not valid: {receipt_handle}"
            )))
        }
    }

    async fn delete_message_batch(
        &self,
        queue: &str,
        entries: &[DeleteBatchEntry],
    ) -> Result<(), TransportError> {
        let mut queues = self.queues.lock().await;
        let state = queues
            .get_mut(queue_name(queue))
            .ok_or_else(|| TransportError::QueueNotFound(queue.to_string()))?;

        // Entries are independent: one bad handle does not block the others.
        let mut failed = Vec::new();
        for entry in entries {
            match decode(&entry.receipt_handle) {
                Ok(handle) if state.delete(&handle) => {}
                _ => failed.push(entry.id.clone()),
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(TransportError::Delete(format!(
                "batch entries failed: {}",
                failed.join(", ")
            )))
        }
    }
}

fn queue_name(queue: &str) -> &str {
    queue.strip_prefix(URL_SCHEME).unwrap_or(queue)
}

fn descriptor(name: &str) -> QueueDescriptor {
    QueueDescriptor {
        name: name.to_string(),
        url: format!("{URL_SCHEME}{name}"),
    }
}

fn decode(receipt_handle: &str) -> Result<String, TransportError> {
    urlencoding::decode(receipt_handle)
        .map(|handle| handle.into_owned())
        .map_err(|e| TransportError::Delete(format!("malformed receipt handle: {e}")))
}
